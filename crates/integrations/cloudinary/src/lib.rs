//! Cloudinary provider for the mediadrop upload pipeline.
//!
//! Uploads go to `POST {api}/v1_1/{cloud_name}/auto/upload`, either unsigned
//! through an upload preset or signed with the account's API secret (SHA-1
//! by default, see [`signature`]). The returned `secure_url` is used verbatim.

pub mod config;
pub mod error;
pub mod provider;
pub mod signature;
pub mod types;

pub use config::CloudinaryConfig;
pub use error::CloudinaryError;
pub use provider::CloudinaryUploader;
pub use signature::{SignatureAlgorithm, sign, string_to_sign};
pub use types::{ApiErrorBody, DestroyResponse, UploadResponse};
