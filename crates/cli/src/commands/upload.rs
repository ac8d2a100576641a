use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use mediadrop_core::{MediaFile, UploadOptions};
use mediadrop_gateway::{
    EditorBridge, ErrorReporter, MediaBus, PasteBatch, PastedFile, UploadService,
};

use crate::OutputFormat;
use crate::host::{NoteEditor, StderrNotifier};

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Files to upload.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Vault path of the note the files are pasted into. Used for folder
    /// routing and ignored folders.
    #[arg(long)]
    pub note: Option<String>,

    /// Vault root. When set, references are appended to the note.
    #[arg(long)]
    pub vault: Option<PathBuf>,

    /// Destination folder at the provider.
    #[arg(long)]
    pub folder: Option<String>,

    /// Tag to attach (repeatable).
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Variant or transformation for the returned URL.
    #[arg(long)]
    pub variant: Option<String>,
}

/// Content type from the file extension.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_owned()
}

async fn read_media(path: &Path) -> anyhow::Result<MediaFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(MediaFile::new(name, content_type_for(path), data))
}

fn options(args: &UploadArgs) -> UploadOptions {
    let mut options = UploadOptions::default();
    if let Some(folder) = &args.folder {
        options = options.with_folder(folder);
    }
    if let Some(variant) = &args.variant {
        options = options.with_transformation(variant);
    }
    for tag in &args.tags {
        options = options.with_tag(tag);
    }
    options
}

pub async fn run(
    service: &Arc<UploadService>,
    bus: &MediaBus,
    args: &UploadArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let mut pasted = PastedFile::new(read_media(path).await?);
        if let Some(note) = &args.note {
            pasted = pasted.in_document(note);
        }
        files.push(pasted);
    }
    let total = files.len();
    let batch = PasteBatch::new(files).with_options(options(args));

    let editor = Arc::new(NoteEditor::new(args.vault.clone()));
    let notifier = Arc::new(StderrNotifier::default());
    let _bridge = EditorBridge::attach(bus, editor.clone(), service.classifier().clone());
    let _reporter = ErrorReporter::attach(bus, notifier.clone(), service.classifier().clone());

    let report = service.handle_paste(batch).await;
    let inserted = editor.inserted();

    match format {
        OutputFormat::Json => {
            let inserted: Vec<_> = inserted
                .iter()
                .map(|i| {
                    serde_json::json!({
                        "file_name": i.file_name,
                        "url": i.url,
                        "kind": i.kind,
                        "markup": i.markup,
                    })
                })
                .collect();
            let out = serde_json::json!({ "report": report, "inserted": inserted });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for insertion in &inserted {
                println!("{}", insertion.markup);
            }
            let skipped = report.skipped_non_media + report.skipped_ignored;
            if skipped > 0 {
                eprintln!("{skipped} of {total} files skipped");
            }
        }
    }

    match notifier.shown() {
        0 => Ok(()),
        errors => anyhow::bail!("{errors} error(s) while uploading {total} file(s)"),
    }
}
