//! Bunny Storage provider for the mediadrop upload pipeline.
//!
//! Files are written with `PUT {storage_host}/{zone}/{path}` into one of
//! several storage zones and served through the zone's pull zone, or through
//! a custom domain mapped to a folder. Which zone receives a file is decided
//! per upload by the rules in [`routing`].
//!
//! Public ids have the shape `{zone}/{path}`.

pub mod config;
pub mod error;
pub mod provider;
pub mod routing;
pub mod types;

pub use config::{BunnyConfig, CustomDomain, StorageZone};
pub use error::BunnyError;
pub use provider::BunnyUploader;
pub use routing::{custom_domain_for_path, routing_warnings, select_zone};
