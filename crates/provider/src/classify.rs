//! Turns heterogeneous failures into the closed [`ErrorKind`] taxonomy.

use std::error::Error as StdError;
use std::sync::Arc;

use mediadrop_core::{ErrorKind, StructuredError};
use tracing::{error, warn};

use crate::error::UploadError;

/// Lowercase fragments that mark an error message as a transport failure.
const NETWORK_SIGNATURES: &[&str] = &[
    "network",
    "fetch",
    "connection",
    "connect",
    "timed out",
    "timeout",
    "dns",
    "unreachable",
    "socket",
];

/// External sink for errors that fit no known category, e.g. a crash
/// reporter.
pub trait ReportHook: Send + Sync {
    fn report(&self, error: &StructuredError);
}

/// Stateless error classifier.
///
/// Classification is a pure function of the input error, so classifying the
/// same error twice always yields the same [`StructuredError`]. The only
/// optional dependency is a [`ReportHook`] that receives `unexpected` errors
/// when they are [reported](ErrorClassifier::report).
#[derive(Clone, Default)]
pub struct ErrorClassifier {
    hook: Option<Arc<dyn ReportHook>>,
}

impl std::fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorClassifier")
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl ErrorClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward `unexpected` errors to `hook` when reporting.
    #[must_use]
    pub fn with_report_hook(mut self, hook: Arc<dyn ReportHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Classify an adapter error.
    pub fn classify(&self, err: &UploadError) -> StructuredError {
        let (kind, message) = match err {
            UploadError::NotConfigured(detail) => (
                ErrorKind::Config,
                format!("Upload provider is not configured: {detail}."),
            ),
            UploadError::Connection(_) | UploadError::Timeout(_) => (
                ErrorKind::Network,
                "Could not reach the upload provider.".to_owned(),
            ),
            UploadError::Rejected(detail) => {
                (ErrorKind::Upload, format!("Upload failed: {detail}"))
            }
            UploadError::InvalidResponse(detail) => (
                ErrorKind::Upload,
                format!("Upload provider returned an unreadable response: {detail}"),
            ),
            UploadError::InvalidRequest(detail) => {
                (ErrorKind::Upload, format!("Upload request was invalid: {detail}"))
            }
            UploadError::RateLimited => (
                ErrorKind::Upload,
                "Upload provider is rate limiting requests.".to_owned(),
            ),
            UploadError::Internal(detail) => {
                (ErrorKind::Unexpected, format!("Unexpected error: {detail}"))
            }
        };
        StructuredError::new(kind, message).with_original(err.to_string())
    }

    /// Classify any error value.
    ///
    /// Walks the source chain looking for an [`UploadError`] or an I/O error;
    /// otherwise falls back to matching network-like signatures in the
    /// message.
    pub fn classify_dyn(&self, err: &(dyn StdError + 'static)) -> StructuredError {
        let mut current: Option<&(dyn StdError + 'static)> = Some(err);
        while let Some(source) = current {
            if let Some(upload) = source.downcast_ref::<UploadError>() {
                return self.classify(upload);
            }
            if let Some(io) = source.downcast_ref::<std::io::Error>()
                && is_network_io(io.kind())
            {
                return network(err);
            }
            current = source.source();
        }

        let message = err.to_string().to_ascii_lowercase();
        if NETWORK_SIGNATURES.iter().any(|sig| message.contains(sig)) {
            return network(err);
        }

        StructuredError::new(ErrorKind::Unexpected, format!("Unexpected error: {err}"))
            .with_original(err.to_string())
    }

    /// Build the error for a failed document insertion.
    pub fn editor_failure(&self, message: impl Into<String>) -> StructuredError {
        StructuredError::new(ErrorKind::Editor, message)
    }

    /// Log a classified error and forward it to the report hook when it is
    /// `unexpected`. Returns whether the hook was invoked.
    pub fn report(&self, err: &StructuredError) -> bool {
        match err.kind {
            ErrorKind::Unexpected => {
                error!(kind = %err.kind, original = ?err.original_error, "{}", err.message);
            }
            _ => warn!(kind = %err.kind, original = ?err.original_error, "{}", err.message),
        }

        match &self.hook {
            Some(hook) if err.is_reportable() => {
                hook.report(err);
                true
            }
            _ => false,
        }
    }
}

fn network(err: &(dyn StdError + 'static)) -> StructuredError {
    StructuredError::new(ErrorKind::Network, "Could not reach the upload provider.")
        .with_original(err.to_string())
}

fn is_network_io(kind: std::io::ErrorKind) -> bool {
    use std::io::ErrorKind as Io;
    matches!(
        kind,
        Io::ConnectionRefused
            | Io::ConnectionReset
            | Io::ConnectionAborted
            | Io::NotConnected
            | Io::TimedOut
            | Io::BrokenPipe
            | Io::AddrNotAvailable
    )
}
