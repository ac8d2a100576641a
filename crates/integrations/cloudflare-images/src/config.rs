use serde::Deserialize;

/// Default Cloudflare API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Default image delivery domain.
pub const DEFAULT_DELIVERY_DOMAIN: &str = "https://imagedelivery.net";

/// Configuration for the Cloudflare Images provider.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CloudflareImagesConfig {
    /// Cloudflare account identifier.
    pub account_id: String,

    /// API token with `Cloudflare Images: Edit` permission.
    pub api_token: String,

    /// Delivery domain prefix. Override to serve through a custom hostname.
    pub delivery_domain: String,

    /// Variant used when a request names none.
    pub default_variant: String,

    /// Base URL for the Cloudflare REST API. Override this for testing
    /// against a mock server.
    pub api_base_url: String,
}

impl Default for CloudflareImagesConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            api_token: String::new(),
            delivery_domain: DEFAULT_DELIVERY_DOMAIN.to_owned(),
            default_variant: "public".to_owned(),
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
        }
    }
}

impl std::fmt::Debug for CloudflareImagesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareImagesConfig")
            .field("account_id", &self.account_id)
            .field("api_token", &"[REDACTED]")
            .field("delivery_domain", &self.delivery_domain)
            .field("default_variant", &self.default_variant)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl CloudflareImagesConfig {
    /// Create a new configuration with the given account id and API token.
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    /// Serve images from a different delivery domain.
    #[must_use]
    pub fn with_delivery_domain(mut self, domain: impl Into<String>) -> Self {
        self.delivery_domain = domain.into();
        self
    }

    /// Set the variant used when none is requested.
    #[must_use]
    pub fn with_default_variant(mut self, variant: impl Into<String>) -> Self {
        self.default_variant = variant.into();
        self
    }

    /// Override the API base URL (useful for testing).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Both the account id and the API token are required to upload.
    pub fn is_configured(&self) -> bool {
        !self.account_id.trim().is_empty() && !self.api_token.trim().is_empty()
    }

    /// The images endpoint of the configured account.
    pub fn images_url(&self) -> String {
        format!(
            "{}/accounts/{}/images/v1",
            self.api_base_url.trim_end_matches('/'),
            self.account_id
        )
    }
}
