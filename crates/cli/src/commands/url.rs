use std::sync::Arc;

use clap::Args;
use mediadrop_gateway::UploadService;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct UrlArgs {
    /// Public id returned by the upload.
    pub public_id: String,

    /// Variant or transformation to apply.
    #[arg(long)]
    pub variant: Option<String>,
}

pub fn run(
    service: &Arc<UploadService>,
    args: &UrlArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let url = service
        .url_for(&args.public_id, args.variant.as_deref())
        .map_err(|err| anyhow::anyhow!("{}", err.user_message()))?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "public_id": args.public_id, "url": url })
        ),
        OutputFormat::Text => println!("{url}"),
    }
    Ok(())
}
