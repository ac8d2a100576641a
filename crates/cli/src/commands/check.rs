use std::sync::Arc;

use mediadrop_core::ProviderKind;
use mediadrop_gateway::{SettingsStore, UploadService};
use serde::Serialize;

use crate::OutputFormat;

#[derive(Debug, Serialize)]
struct CheckReport {
    provider: String,
    configured: bool,
    warnings: Vec<String>,
}

pub fn run(
    service: &Arc<UploadService>,
    store: &SettingsStore,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let settings = store.snapshot();
    let uploader = service
        .active_uploader()
        .map_err(|err| anyhow::anyhow!("{}", err.user_message()))?;

    let warnings = match uploader.kind() {
        ProviderKind::Bunny => mediadrop_bunny::routing_warnings(&settings.bunny),
        _ => Vec::new(),
    };
    let report = CheckReport {
        provider: uploader.name().to_owned(),
        configured: uploader.is_configured(),
        warnings,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            let state = if report.configured { "configured" } else { "NOT configured" };
            println!("{}: {state}", report.provider);
            for warning in &report.warnings {
                println!("  warning: {warning}");
            }
        }
    }

    if report.configured {
        Ok(())
    } else {
        anyhow::bail!("{} is missing required settings", report.provider)
    }
}
