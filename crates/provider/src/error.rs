use thiserror::Error;

/// Errors an upload provider can return.
///
/// Each provider crate has its own internal error type that is converted into
/// this one at the public API boundary, so no raw backend error escapes an
/// adapter.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Required credentials or settings are missing. Raised before any I/O.
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// A network or transport-level error occurred; no usable response.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The backend answered and reported a failure.
    #[error("upload rejected: {0}")]
    Rejected(String),

    /// The backend answered with a body that could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built from the given file or options.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The backend rejected the request due to rate limiting.
    #[error("rate limited")]
    RateLimited,

    /// A failure that fits none of the above.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = UploadError::NotConfigured("api token missing".into());
        assert_eq!(
            err.to_string(),
            "provider not configured: api token missing"
        );

        let err = UploadError::RateLimited;
        assert_eq!(err.to_string(), "rate limited");
    }
}
