use std::sync::Arc;

use clap::Args;
use mediadrop_gateway::UploadService;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Public id returned by the upload.
    pub public_id: String,
}

pub async fn run(
    service: &Arc<UploadService>,
    args: &DeleteArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match service.delete(&args.public_id).await {
        Ok(()) => {
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "public_id": args.public_id, "deleted": true })
                ),
                OutputFormat::Text => println!("Deleted {}.", args.public_id),
            }
            Ok(())
        }
        Err(err) => {
            if let OutputFormat::Json = format {
                println!("{}", serde_json::to_string_pretty(&err)?);
            }
            anyhow::bail!("{}", err.user_message())
        }
    }
}
