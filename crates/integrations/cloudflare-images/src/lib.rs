//! Cloudflare Images provider for the mediadrop upload pipeline.
//!
//! This crate implements the [`Uploader`](mediadrop_provider::Uploader) trait
//! on top of the
//! [Cloudflare Images API](https://developers.cloudflare.com/images/).
//! Uploaded images are delivered through named variants at
//! `{delivery_domain}/{account_id}/{image_id}/{variant}`.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use mediadrop_cloudflare_images::{CloudflareImagesConfig, CloudflareImagesUploader};
//!
//! let config = CloudflareImagesConfig::new("account-id", "api-token")
//!     .with_default_variant("blog");
//! let uploader = CloudflareImagesUploader::new(config);
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::CloudflareImagesConfig;
pub use error::CloudflareImagesError;
pub use provider::{
    CloudflareImagesUploader, ID_SEGMENT, delete_image, file_part, post_image,
};
pub use types::{ApiMessage, CloudflareEnvelope, ImageResult, decode_envelope};
