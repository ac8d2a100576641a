//! Upload lifecycle and event wiring for mediadrop.
//!
//! The gateway owns the settings snapshot, picks the active provider adapter
//! and connects it to the [`MediaBus`]:
//!
//! 1. A host publishes [`MediaEvent::PasteDetected`].
//! 2. [`UploadService`] filters the batch and uploads the survivors.
//! 3. Each file settles into [`MediaEvent::MediaUploaded`] or
//!    [`MediaEvent::MediaUploadError`].
//! 4. [`EditorBridge`] inserts references; [`ErrorReporter`] notifies.

pub mod batch;
pub mod editor;
pub mod events;
pub mod notify;
pub mod selector;
pub mod service;
pub mod settings;

pub use batch::{BatchReport, is_ignored, upload_batch};
pub use editor::{EditorBridge, EditorError, EditorSink, Insertion, render_reference};
pub use events::{
    MediaBus, MediaEvent, MediaEventKind, PasteBatch, PasteOrigin, PastedFile, UNKNOWN_FILE_NAME,
    UploadFailure, UploadedMedia,
};
pub use notify::{ErrorReporter, Notifier, notification_text};
pub use selector::{ProviderSelector, SelectorError};
pub use service::UploadService;
pub use settings::{DEFAULT_TIMEOUT_SECS, Settings, SettingsError, SettingsStore};
