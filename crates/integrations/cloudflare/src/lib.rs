//! Cloudflare Images + Stream provider for the mediadrop upload pipeline.
//!
//! Images go to [Cloudflare Images](https://developers.cloudflare.com/images/)
//! and videos to [Cloudflare Stream](https://developers.cloudflare.com/stream/),
//! each with its own API token. Video public ids carry the `video:` prefix so
//! URL derivation and deletion know which product to address.

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::CloudflareConfig;
pub use error::CloudflareError;
pub use provider::CloudflareUploader;
pub use types::{Playback, StreamInput, StreamVideo};
