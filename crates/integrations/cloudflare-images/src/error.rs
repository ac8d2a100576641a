use mediadrop_provider::UploadError;
use thiserror::Error;

/// Errors specific to the Cloudflare Images provider.
///
/// These are internal errors that get converted into [`UploadError`] at the
/// public API boundary.
#[derive(Debug, Error)]
pub enum CloudflareImagesError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Cloudflare API returned an error response.
    #[error("Cloudflare Images API error: {0}")]
    Api(String),

    /// The API answered with a body we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The file cannot be sent to this provider.
    #[error("{0}")]
    InvalidRequest(String),

    /// Required settings are missing.
    #[error("{0}")]
    NotConfigured(String),

    /// The provider received an HTTP 429 (Too Many Requests) response.
    #[error("rate limited by Cloudflare")]
    RateLimited,
}

impl From<CloudflareImagesError> for UploadError {
    fn from(err: CloudflareImagesError) -> Self {
        match err {
            CloudflareImagesError::Http(e) if e.is_timeout() => UploadError::Timeout(e.to_string()),
            CloudflareImagesError::Http(e) if e.is_decode() => {
                UploadError::InvalidResponse(e.to_string())
            }
            CloudflareImagesError::Http(e) => UploadError::Connection(e.to_string()),
            CloudflareImagesError::Api(msg) => UploadError::Rejected(msg),
            CloudflareImagesError::InvalidResponse(msg) => UploadError::InvalidResponse(msg),
            CloudflareImagesError::InvalidRequest(msg) => UploadError::InvalidRequest(msg),
            CloudflareImagesError::NotConfigured(msg) => UploadError::NotConfigured(msg),
            CloudflareImagesError::RateLimited => UploadError::RateLimited,
        }
    }
}
