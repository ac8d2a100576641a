//! mediadrop CLI
//!
//! Uploads media files through the configured provider and prints the
//! references an editor would insert.

mod commands;
mod host;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mediadrop_gateway::{MediaBus, Settings, SettingsStore, UploadService};
use mediadrop_provider::ErrorClassifier;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// Settings file read when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "mediadrop.toml";

/// mediadrop: upload pasted media to a hosting provider.
#[derive(Parser, Debug)]
#[command(name = "mediadrop", version, about)]
struct Cli {
    /// Settings file (TOML).
    #[arg(long, env = "MEDIADROP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Use this provider instead of the one in the settings file.
    #[arg(long, env = "MEDIADROP_PROVIDER", global = true)]
    provider: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload files and print their references.
    Upload(commands::upload::UploadArgs),
    /// Delete a previously uploaded asset.
    Delete(commands::delete::DeleteArgs),
    /// Print the delivery URL of an uploaded asset.
    Url(commands::url::UrlArgs),
    /// Validate the settings of the selected provider.
    Check,
}

/// Load settings from `path`, or from `mediadrop.toml` when it exists, or
/// fall back to defaults.
fn load_settings(path: Option<&Path>, provider: Option<&str>) -> anyhow::Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Settings::load(DEFAULT_CONFIG_FILE)?,
        None => {
            debug!("no settings file, using defaults");
            Settings::default()
        }
    };
    if let Some(provider) = provider {
        settings.provider = provider.to_owned();
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref(), cli.provider.as_deref())?;
    let bus = MediaBus::new();
    let store = Arc::new(SettingsStore::new(settings, bus.clone()));
    let service = Arc::new(UploadService::new(Arc::clone(&store), ErrorClassifier::new()));
    let _subscriptions = service.attach();

    match cli.command {
        Command::Upload(args) => commands::upload::run(&service, &bus, &args, &cli.format).await,
        Command::Delete(args) => commands::delete::run(&service, &args, &cli.format).await,
        Command::Url(args) => commands::url::run(&service, &args, &cli.format),
        Command::Check => commands::check::run(&service, &store, &cli.format),
    }
}
