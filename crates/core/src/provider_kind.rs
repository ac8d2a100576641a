use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The supported media-hosting backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Cloudflare Images with named delivery variants.
    CloudflareImages,
    /// Cloudflare Images for pictures plus Cloudflare Stream for video.
    Cloudflare,
    /// Bunny storage zones fronted by pull zones.
    Bunny,
    /// Cloudinary signed or preset-based uploads.
    Cloudinary,
}

/// Returned when a settings blob names a provider this build does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported provider: {0}")]
pub struct UnsupportedProvider(pub String);

impl ProviderKind {
    pub const ALL: [Self; 4] = [
        Self::CloudflareImages,
        Self::Cloudflare,
        Self::Bunny,
        Self::Cloudinary,
    ];

    /// The identifier used in settings files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CloudflareImages => "cloudflare-images",
            Self::Cloudflare => "cloudflare",
            Self::Bunny => "bunny",
            Self::Cloudinary => "cloudinary",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UnsupportedProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnsupportedProvider(s.to_owned()))
    }
}
