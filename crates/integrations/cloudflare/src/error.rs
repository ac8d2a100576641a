use mediadrop_cloudflare_images::CloudflareImagesError;
use mediadrop_provider::UploadError;
use thiserror::Error;

/// Errors specific to the Cloudflare Images + Stream provider.
#[derive(Debug, Error)]
pub enum CloudflareError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Cloudflare API returned an error response.
    #[error("Cloudflare API error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    InvalidRequest(String),

    /// Credentials for the requested media kind are missing.
    #[error("{0}")]
    NotConfigured(String),

    #[error("rate limited by Cloudflare")]
    RateLimited,
}

impl From<CloudflareImagesError> for CloudflareError {
    fn from(err: CloudflareImagesError) -> Self {
        match err {
            CloudflareImagesError::Http(e) => Self::Http(e),
            CloudflareImagesError::Api(msg) => Self::Api(msg),
            CloudflareImagesError::InvalidResponse(msg) => Self::InvalidResponse(msg),
            CloudflareImagesError::InvalidRequest(msg) => Self::InvalidRequest(msg),
            CloudflareImagesError::NotConfigured(msg) => Self::NotConfigured(msg),
            CloudflareImagesError::RateLimited => Self::RateLimited,
        }
    }
}

impl From<CloudflareError> for UploadError {
    fn from(err: CloudflareError) -> Self {
        match err {
            CloudflareError::Http(e) if e.is_timeout() => UploadError::Timeout(e.to_string()),
            CloudflareError::Http(e) if e.is_decode() => {
                UploadError::InvalidResponse(e.to_string())
            }
            CloudflareError::Http(e) => UploadError::Connection(e.to_string()),
            CloudflareError::Api(msg) => UploadError::Rejected(msg),
            CloudflareError::InvalidResponse(msg) => UploadError::InvalidResponse(msg),
            CloudflareError::InvalidRequest(msg) => UploadError::InvalidRequest(msg),
            CloudflareError::NotConfigured(msg) => UploadError::NotConfigured(msg),
            CloudflareError::RateLimited => UploadError::RateLimited,
        }
    }
}
