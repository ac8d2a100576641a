use futures::future::join_all;
use mediadrop_core::{UploadOptions, UploadRequest, is_within_folder};
use mediadrop_provider::{DynUploader, ErrorClassifier, UploadError};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::events::{
    MediaBus, MediaEvent, PasteBatch, PastedFile, UploadFailure, UploadedMedia,
};

/// Tally of what happened to a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Files that produced a `MediaUploaded` event.
    pub uploaded: usize,
    /// Files that produced their own `MediaUploadError` event.
    pub failed: usize,
    pub skipped_non_media: usize,
    pub skipped_ignored: usize,
    /// The whole batch was dropped because the provider lacks settings.
    pub not_configured: bool,
}

/// Returns `true` when `document_path` lies under one of `ignored_folders`.
///
/// A file without a document path is never ignored.
pub fn is_ignored(document_path: Option<&str>, ignored_folders: &[String]) -> bool {
    document_path.is_some_and(|path| {
        ignored_folders
            .iter()
            .any(|folder| is_within_folder(path, folder))
    })
}

/// Run one paste or drop through `uploader`.
///
/// Non-media files and files from ignored folders are dropped first. If
/// anything survives and the uploader is not configured, a single `config`
/// error is published for the whole batch. Otherwise every survivor is
/// uploaded concurrently and gets its own success or failure event, published
/// as soon as that file settles.
#[instrument(
    skip_all,
    fields(provider = %uploader.name(), files = batch.files.len(), origin = ?batch.origin)
)]
pub async fn upload_batch(
    uploader: &dyn DynUploader,
    batch: PasteBatch,
    ignored_folders: &[String],
    classifier: &ErrorClassifier,
    bus: &MediaBus,
) -> BatchReport {
    let mut report = BatchReport::default();
    let PasteBatch { files, options, .. } = batch;

    let mut survivors = Vec::with_capacity(files.len());
    for pasted in files {
        if !pasted.file.is_media() {
            debug!(
                file = %pasted.file.name,
                content_type = %pasted.file.content_type,
                "skipping non-media file"
            );
            report.skipped_non_media += 1;
        } else if is_ignored(pasted.document_path.as_deref(), ignored_folders) {
            debug!(
                file = %pasted.file.name,
                document = ?pasted.document_path,
                "skipping file in ignored folder"
            );
            report.skipped_ignored += 1;
        } else {
            survivors.push(pasted);
        }
    }

    if survivors.is_empty() {
        return report;
    }

    if !uploader.is_configured() {
        warn!(provider = %uploader.name(), "upload provider is not configured");
        let err =
            UploadError::NotConfigured(format!("{} settings are incomplete", uploader.name()));
        bus.publish(&MediaEvent::MediaUploadError(UploadFailure::batch(
            classifier.classify(&err),
        )));
        report.not_configured = true;
        return report;
    }

    let uploads = survivors
        .into_iter()
        .map(|pasted| upload_one(uploader, pasted, &options, classifier, bus));
    for succeeded in join_all(uploads).await {
        if succeeded {
            report.uploaded += 1;
        } else {
            report.failed += 1;
        }
    }

    info!(
        uploaded = report.uploaded,
        failed = report.failed,
        skipped = report.skipped_non_media + report.skipped_ignored,
        "batch finished"
    );
    report
}

async fn upload_one(
    uploader: &dyn DynUploader,
    pasted: PastedFile,
    options: &UploadOptions,
    classifier: &ErrorClassifier,
    bus: &MediaBus,
) -> bool {
    let PastedFile {
        file,
        document_path,
    } = pasted;
    let file_name = file.name.clone();
    let Some(kind) = file.kind() else {
        return false;
    };

    let request = UploadRequest::new(file)
        .with_options(request_options(options, document_path.as_deref()));
    match uploader.upload(request).await {
        Ok(result) => {
            debug!(file = %file_name, url = %result.url, "file uploaded");
            bus.publish(&MediaEvent::MediaUploaded(UploadedMedia {
                url: result.url.clone(),
                file_name,
                kind,
                document_path,
                result,
            }));
            true
        }
        Err(err) => {
            let error = classifier
                .classify(&err)
                .with_context("file_name", file_name.as_str())
                .with_context("provider", uploader.name());
            let failure = UploadFailure::new(error, file_name);
            bus.publish(&MediaEvent::MediaUploadError(failure));
            false
        }
    }
}

fn request_options(options: &UploadOptions, document_path: Option<&str>) -> UploadOptions {
    let mut options = options.clone();
    if options.source_path.is_none()
        && let Some(path) = document_path
    {
        options.source_path = Some(path.to_owned());
    }
    options
}
