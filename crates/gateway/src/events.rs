use std::sync::Arc;

use mediadrop_bus::{BusEvent, EventBus};
use mediadrop_core::{MediaFile, MediaKind, StructuredError, UploadOptions, UploadResult};
use serde::Serialize;

use crate::settings::Settings;

/// File name attached to errors that concern a whole batch rather than one
/// file.
pub const UNKNOWN_FILE_NAME: &str = "unknown";

/// The bus every pipeline component talks through.
pub type MediaBus = EventBus<MediaEvent>;

/// Events flowing through the upload pipeline.
#[derive(Debug, Clone)]
pub enum MediaEvent {
    /// Files were pasted or dropped into a document.
    PasteDetected(PasteBatch),
    /// A new settings snapshot is in effect.
    SettingsUpdated(Arc<Settings>),
    /// One file finished uploading.
    MediaUploaded(UploadedMedia),
    /// One file, or a whole batch, failed.
    MediaUploadError(UploadFailure),
}

/// Discriminant of [`MediaEvent`], used to subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEventKind {
    PasteDetected,
    SettingsUpdated,
    MediaUploaded,
    MediaUploadError,
}

impl BusEvent for MediaEvent {
    type Kind = MediaEventKind;

    fn kind(&self) -> MediaEventKind {
        match self {
            Self::PasteDetected(_) => MediaEventKind::PasteDetected,
            Self::SettingsUpdated(_) => MediaEventKind::SettingsUpdated,
            Self::MediaUploaded(_) => MediaEventKind::MediaUploaded,
            Self::MediaUploadError(_) => MediaEventKind::MediaUploadError,
        }
    }
}

/// How the files reached the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasteOrigin {
    Paste,
    Drop,
}

/// A file from a paste or drop, with the document it landed in.
#[derive(Debug, Clone)]
pub struct PastedFile {
    pub file: MediaFile,
    /// Vault path of the receiving document.
    pub document_path: Option<String>,
}

impl PastedFile {
    pub fn new(file: MediaFile) -> Self {
        Self {
            file,
            document_path: None,
        }
    }

    #[must_use]
    pub fn in_document(mut self, path: impl Into<String>) -> Self {
        self.document_path = Some(path.into());
        self
    }
}

/// Everything pasted or dropped in one gesture.
#[derive(Debug, Clone)]
pub struct PasteBatch {
    pub files: Vec<PastedFile>,
    /// Destination hints applied to every file.
    pub options: UploadOptions,
    pub origin: PasteOrigin,
}

impl PasteBatch {
    pub fn new(files: Vec<PastedFile>) -> Self {
        Self {
            files,
            options: UploadOptions::default(),
            origin: PasteOrigin::Paste,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn dropped(mut self) -> Self {
        self.origin = PasteOrigin::Drop;
        self
    }
}

/// Payload of [`MediaEvent::MediaUploaded`].
#[derive(Debug, Clone, Serialize)]
pub struct UploadedMedia {
    pub url: String,
    pub file_name: String,
    pub kind: MediaKind,
    /// Vault path of the document the file was pasted into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,
    pub result: UploadResult,
}

/// Payload of [`MediaEvent::MediaUploadError`].
#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub error: StructuredError,
    pub file_name: String,
}

impl UploadFailure {
    pub fn new(error: StructuredError, file_name: impl Into<String>) -> Self {
        Self {
            error,
            file_name: file_name.into(),
        }
    }

    /// A failure not tied to any single file.
    pub fn batch(error: StructuredError) -> Self {
        Self::new(error, UNKNOWN_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use mediadrop_core::ErrorKind;

    use super::*;

    #[test]
    fn kinds_match_variants() {
        let batch = PasteBatch::new(vec![]);
        assert_eq!(
            MediaEvent::PasteDetected(batch).kind(),
            MediaEventKind::PasteDetected
        );
        let failure = UploadFailure::batch(StructuredError::new(ErrorKind::Config, "x"));
        assert_eq!(
            MediaEvent::MediaUploadError(failure).kind(),
            MediaEventKind::MediaUploadError
        );
    }

    #[test]
    fn batch_failure_uses_unknown_name() {
        let failure = UploadFailure::batch(StructuredError::new(ErrorKind::Config, "x"));
        assert_eq!(failure.file_name, "unknown");
    }

    #[test]
    fn failure_serializes_with_type_tag() {
        let failure = UploadFailure::new(
            StructuredError::new(ErrorKind::Network, "offline"),
            "cat.png",
        );
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["file_name"], "cat.png");
        assert_eq!(json["error"]["type"], "network");
    }
}
