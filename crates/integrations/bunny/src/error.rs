use mediadrop_provider::UploadError;
use thiserror::Error;

/// Errors specific to the Bunny Storage provider.
#[derive(Debug, Error)]
pub enum BunnyError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The storage API answered with a failure.
    #[error("Bunny Storage error: {0}")]
    Api(String),

    /// The public id does not have the `{zone}/{path}` shape.
    #[error("{0}")]
    InvalidRequest(String),

    /// No zone can take the file, or a zone lacks its access key.
    #[error("{0}")]
    NotConfigured(String),

    #[error("rate limited by Bunny")]
    RateLimited,
}

impl From<BunnyError> for UploadError {
    fn from(err: BunnyError) -> Self {
        match err {
            BunnyError::Http(e) if e.is_timeout() => UploadError::Timeout(e.to_string()),
            BunnyError::Http(e) => UploadError::Connection(e.to_string()),
            BunnyError::Api(msg) => UploadError::Rejected(msg),
            BunnyError::InvalidRequest(msg) => UploadError::InvalidRequest(msg),
            BunnyError::NotConfigured(msg) => UploadError::NotConfigured(msg),
            BunnyError::RateLimited => UploadError::RateLimited,
        }
    }
}
