use std::sync::Arc;

use mediadrop_bus::Subscription;
use mediadrop_provider::ErrorClassifier;

use crate::events::{MediaBus, MediaEvent, MediaEventKind, UNKNOWN_FILE_NAME, UploadFailure};

/// Implemented by the host to show a message to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Turns `MediaUploadError` events into log lines and user notifications.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Every error event is reported through `classifier` and produces
    /// exactly one call to `notifier`.
    pub fn attach(
        bus: &MediaBus,
        notifier: Arc<dyn Notifier>,
        classifier: ErrorClassifier,
    ) -> Subscription {
        bus.subscribe(MediaEventKind::MediaUploadError, move |event| {
            let MediaEvent::MediaUploadError(failure) = event else {
                return;
            };
            classifier.report(&failure.error);
            notifier.notify(&notification_text(failure));
        })
    }
}

/// The user-facing text for `failure`.
pub fn notification_text(failure: &UploadFailure) -> String {
    let message = failure.error.user_message();
    if failure.file_name == UNKNOWN_FILE_NAME {
        message
    } else {
        format!("{}: {message}", failure.file_name)
    }
}
