//! Hand-off of finished uploads to the host editor.

use std::sync::Arc;

use mediadrop_bus::Subscription;
use mediadrop_core::MediaKind;
use mediadrop_provider::ErrorClassifier;
use thiserror::Error;
use tracing::{debug, warn};

use crate::events::{MediaBus, MediaEvent, MediaEventKind, UploadFailure, UploadedMedia};

/// A reference ready to be written into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub file_name: String,
    pub url: String,
    pub kind: MediaKind,
    pub document_path: Option<String>,
    /// The rendered markdown or HTML.
    pub markup: String,
}

impl Insertion {
    pub fn for_upload(media: &UploadedMedia) -> Self {
        Self {
            file_name: media.file_name.clone(),
            url: media.url.clone(),
            kind: media.kind,
            document_path: media.document_path.clone(),
            markup: render_reference(media.kind, &media.file_name, &media.url),
        }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct EditorError(pub String);

/// Implemented by the host to put references into documents.
pub trait EditorSink: Send + Sync {
    fn insert(&self, insertion: &Insertion) -> Result<(), EditorError>;
}

/// Markdown image for pictures, an HTML `<video>` element for video.
pub fn render_reference(kind: MediaKind, file_name: &str, url: &str) -> String {
    match kind {
        MediaKind::Image => format!("![{}]({url})", escape_alt(file_name)),
        MediaKind::Video => format!("<video src=\"{url}\" controls></video>"),
    }
}

fn escape_alt(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Forwards `MediaUploaded` events to an [`EditorSink`].
pub struct EditorBridge;

impl EditorBridge {
    /// Insert every uploaded file through `sink`. A failed insertion is
    /// published as an `editor` error for that file.
    pub fn attach(
        bus: &MediaBus,
        sink: Arc<dyn EditorSink>,
        classifier: ErrorClassifier,
    ) -> Subscription {
        let publisher = bus.clone();
        bus.subscribe(MediaEventKind::MediaUploaded, move |event| {
            let MediaEvent::MediaUploaded(media) = event else {
                return;
            };
            let insertion = Insertion::for_upload(media);
            match sink.insert(&insertion) {
                Ok(()) => debug!(file = %media.file_name, "reference inserted"),
                Err(err) => {
                    warn!(file = %media.file_name, error = %err, "reference insertion failed");
                    let message =
                        format!("Could not insert {} into the document.", media.file_name);
                    let error = classifier
                        .editor_failure(message)
                        .with_original(err.to_string());
                    publisher.publish(&MediaEvent::MediaUploadError(UploadFailure::new(
                        error,
                        media.file_name.clone(),
                    )));
                }
            }
        })
    }
}
