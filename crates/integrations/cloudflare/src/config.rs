use mediadrop_cloudflare_images::CloudflareImagesConfig;
use mediadrop_cloudflare_images::config::DEFAULT_API_BASE_URL;
use serde::Deserialize;

/// Default Stream delivery domain.
pub const DEFAULT_STREAM_DOMAIN: &str = "https://videodelivery.net";

/// Delivery host for images when no custom domain is configured.
pub const IMAGE_DELIVERY_DOMAIN: &str = "https://imagedelivery.net";

/// Configuration for the combined Cloudflare Images + Stream provider.
///
/// Images and videos use separate API tokens; either one alone is enough to
/// enable the provider for that media kind.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CloudflareConfig {
    /// Cloudflare account identifier.
    pub account_id: String,

    /// Account hash used in image delivery URLs. Falls back to `account_id`.
    pub account_hash: Option<String>,

    /// API token for Cloudflare Images.
    pub images_token: Option<String>,

    /// API token for Cloudflare Stream.
    pub stream_token: Option<String>,

    /// Custom hostname proxied through Cloudflare, e.g. `img.example.com`.
    pub custom_domain: Option<String>,

    /// Image variant used when a request names none.
    pub default_variant: String,

    /// Stream delivery domain for playback manifests.
    pub stream_domain: String,

    /// Base URL for the Cloudflare REST API.
    pub api_base_url: String,
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            account_hash: None,
            images_token: None,
            stream_token: None,
            custom_domain: None,
            default_variant: "public".to_owned(),
            stream_domain: DEFAULT_STREAM_DOMAIN.to_owned(),
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
        }
    }
}

impl std::fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("CloudflareConfig")
            .field("account_id", &self.account_id)
            .field("account_hash", &self.account_hash)
            .field("images_token", &redact(&self.images_token))
            .field("stream_token", &redact(&self.stream_token))
            .field("custom_domain", &self.custom_domain)
            .field("default_variant", &self.default_variant)
            .field("stream_domain", &self.stream_domain)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl CloudflareConfig {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_images_token(mut self, token: impl Into<String>) -> Self {
        self.images_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_stream_token(mut self, token: impl Into<String>) -> Self {
        self.stream_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_account_hash(mut self, hash: impl Into<String>) -> Self {
        self.account_hash = Some(hash.into());
        self
    }

    #[must_use]
    pub fn with_custom_domain(mut self, domain: impl Into<String>) -> Self {
        self.custom_domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_default_variant(mut self, variant: impl Into<String>) -> Self {
        self.default_variant = variant.into();
        self
    }

    #[must_use]
    pub fn with_stream_domain(mut self, domain: impl Into<String>) -> Self {
        self.stream_domain = domain.into();
        self
    }

    /// Override the API base URL (useful for testing).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn images_token(&self) -> Option<&str> {
        present(self.images_token.as_ref())
    }

    pub fn stream_token(&self) -> Option<&str> {
        present(self.stream_token.as_ref())
    }

    /// The account segment of image delivery URLs.
    pub fn delivery_account(&self) -> &str {
        present(self.account_hash.as_ref()).unwrap_or(&self.account_id)
    }

    /// An account id plus at least one of the two tokens.
    pub fn is_configured(&self) -> bool {
        !self.account_id.trim().is_empty()
            && (self.images_token().is_some() || self.stream_token().is_some())
    }

    /// Images API settings for this account, if an images token is set.
    pub fn images_config(&self) -> Option<CloudflareImagesConfig> {
        self.images_token().map(|token| {
            CloudflareImagesConfig::new(self.account_id.clone(), token)
                .with_api_base_url(self.api_base_url.clone())
                .with_default_variant(self.default_variant.clone())
        })
    }

    /// The Stream endpoint of the configured account.
    pub fn stream_url(&self) -> String {
        format!(
            "{}/accounts/{}/stream",
            self.api_base_url.trim_end_matches('/'),
            self.account_id
        )
    }
}
