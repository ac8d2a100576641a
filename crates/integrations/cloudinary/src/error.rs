use mediadrop_provider::UploadError;
use thiserror::Error;

/// Errors specific to the Cloudinary provider.
#[derive(Debug, Error)]
pub enum CloudinaryError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cloudinary answered with an `error` body or a failure status.
    #[error("Cloudinary API error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotConfigured(String),

    #[error("rate limited by Cloudinary")]
    RateLimited,
}

impl From<CloudinaryError> for UploadError {
    fn from(err: CloudinaryError) -> Self {
        match err {
            CloudinaryError::Http(e) if e.is_timeout() => UploadError::Timeout(e.to_string()),
            CloudinaryError::Http(e) if e.is_decode() => {
                UploadError::InvalidResponse(e.to_string())
            }
            CloudinaryError::Http(e) => UploadError::Connection(e.to_string()),
            CloudinaryError::Api(msg) => UploadError::Rejected(msg),
            CloudinaryError::InvalidResponse(msg) => UploadError::InvalidResponse(msg),
            CloudinaryError::InvalidRequest(msg) => UploadError::InvalidRequest(msg),
            CloudinaryError::NotConfigured(msg) => UploadError::NotConfigured(msg),
            CloudinaryError::RateLimited => UploadError::RateLimited,
        }
    }
}
