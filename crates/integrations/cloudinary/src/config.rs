use serde::Deserialize;

use crate::signature::SignatureAlgorithm;

/// Default Cloudinary upload API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";

/// Default Cloudinary delivery host.
pub const DEFAULT_DELIVERY_BASE_URL: &str = "https://res.cloudinary.com";

/// Configuration for the Cloudinary provider.
///
/// With an `upload_preset` uploads are unsigned; otherwise `api_key` and
/// `api_secret` are needed to sign them. Deleting always needs the secret.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,

    /// Unsigned upload preset. Takes precedence over signing.
    pub upload_preset: Option<String>,

    /// Folder applied when a request names none.
    pub folder: Option<String>,

    /// Digest for signed requests. Must match the account setting.
    pub signature_algorithm: SignatureAlgorithm,

    pub api_base_url: String,
    pub delivery_base_url: String,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: None,
            api_secret: None,
            upload_preset: None,
            folder: None,
            signature_algorithm: SignatureAlgorithm::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            delivery_base_url: DEFAULT_DELIVERY_BASE_URL.to_owned(),
        }
    }
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("upload_preset", &self.upload_preset)
            .field("folder", &self.folder)
            .field("signature_algorithm", &self.signature_algorithm)
            .field("api_base_url", &self.api_base_url)
            .field("delivery_base_url", &self.delivery_base_url)
            .finish()
    }
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl CloudinaryConfig {
    pub fn new(cloud_name: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            ..Self::default()
        }
    }

    /// Sign uploads with the given API credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        self.api_key = Some(api_key.into());
        self.api_secret = Some(api_secret.into());
        self
    }

    /// Upload unsigned through `preset`.
    #[must_use]
    pub fn with_upload_preset(mut self, preset: impl Into<String>) -> Self {
        self.upload_preset = Some(preset.into());
        self
    }

    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    #[must_use]
    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    /// Override the API base URL (useful for testing).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_delivery_base_url(mut self, url: impl Into<String>) -> Self {
        self.delivery_base_url = url.into();
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        present(self.api_key.as_ref())
    }

    pub fn upload_preset(&self) -> Option<&str> {
        present(self.upload_preset.as_ref())
    }

    pub fn default_folder(&self) -> Option<&str> {
        present(self.folder.as_ref())
    }

    /// API key and secret, when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.api_key()?, present(self.api_secret.as_ref())?))
    }

    /// A cloud name plus either a preset or signing credentials.
    pub fn is_configured(&self) -> bool {
        !self.cloud_name.trim().is_empty()
            && (self.upload_preset().is_some() || self.credentials().is_some())
    }

    /// `{api}/v1_1/{cloud}/{resource_type}/{action}`.
    pub fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{resource_type}/{action}",
            self.api_base_url.trim_end_matches('/'),
            self.cloud_name
        )
    }
}
