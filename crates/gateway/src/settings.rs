use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mediadrop_bunny::BunnyConfig;
use mediadrop_cloudflare::CloudflareConfig;
use mediadrop_cloudflare_images::CloudflareImagesConfig;
use mediadrop_cloudinary::CloudinaryConfig;
use mediadrop_core::{ProviderKind, UnsupportedProvider};
use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::events::{MediaBus, MediaEvent};

/// Request timeout applied when the settings name none.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything the upload pipeline reads from the settings file.
///
/// ```toml
/// provider = "bunny"
/// ignored_folders = ["Private", "Templates"]
///
/// [bunny]
/// default_zone = "misc"
///
/// [[bunny.zones]]
/// name = "blog"
/// access_key = "..."
/// pull_zone_url = "blog.b-cdn.net"
/// folders = ["Blog"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identifier of the active provider, e.g. `"cloudinary"`.
    pub provider: String,

    /// Documents under these folders never trigger uploads.
    pub ignored_folders: Vec<String>,

    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,

    pub cloudflare_images: CloudflareImagesConfig,
    pub cloudflare: CloudflareConfig,
    pub bunny: BunnyConfig,
    pub cloudinary: CloudinaryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::CloudflareImages.as_str().to_owned(),
            ignored_folders: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cloudflare_images: CloudflareImagesConfig::default(),
            cloudflare: CloudflareConfig::default(),
            bunny: BunnyConfig::default(),
            cloudinary: CloudinaryConfig::default(),
        }
    }
}

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Settings {
    /// Parse settings from TOML text. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&text)?;
        debug!(path = %path.display(), provider = %settings.provider, "settings loaded");
        Ok(settings)
    }

    /// The selected provider, if the identifier is recognized.
    pub fn provider_kind(&self) -> Result<ProviderKind, UnsupportedProvider> {
        self.provider.parse()
    }

    /// HTTP request timeout for provider clients.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(if self.timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            self.timeout_secs
        })
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    #[must_use]
    pub fn with_ignored_folder(mut self, folder: impl Into<String>) -> Self {
        self.ignored_folders.push(folder.into());
        self
    }
}

/// The single process-wide holder of the current [`Settings`].
///
/// Readers take an `Arc` snapshot and keep using it for the whole operation;
/// [`update`](SettingsStore::update) swaps in a new snapshot and announces it
/// on the bus.
pub struct SettingsStore {
    current: RwLock<Arc<Settings>>,
    bus: MediaBus,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("provider", &self.current.read().provider)
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    pub fn new(settings: Settings, bus: MediaBus) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
            bus,
        }
    }

    /// The current settings.
    pub fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&self.current.read())
    }

    /// Replace the settings and publish [`MediaEvent::SettingsUpdated`].
    pub fn update(&self, settings: Settings) {
        let settings = Arc::new(settings);
        *self.current.write() = Arc::clone(&settings);
        info!(provider = %settings.provider, "settings updated");
        self.bus.publish(&MediaEvent::SettingsUpdated(settings));
    }

    pub fn bus(&self) -> &MediaBus {
        &self.bus
    }
}
