use serde::Deserialize;

/// Default Bunny storage endpoint (Falkenstein).
pub const DEFAULT_STORAGE_HOST: &str = "https://storage.bunnycdn.com";

/// One Bunny storage zone and the vault folders routed to it.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageZone {
    /// Storage zone name, also the first path segment on the storage API.
    pub name: String,

    /// Storage zone password, sent as the `AccessKey` header.
    pub access_key: String,

    /// Pull zone URL that serves this zone, e.g. `https://blog.b-cdn.net`.
    pub pull_zone_url: String,

    /// Vault folders whose files are stored in this zone.
    pub folders: Vec<String>,

    /// Regional storage endpoint, overriding [`BunnyConfig::storage_host`].
    pub storage_host: Option<String>,
}

impl std::fmt::Debug for StorageZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageZone")
            .field("name", &self.name)
            .field("access_key", &"[REDACTED]")
            .field("pull_zone_url", &self.pull_zone_url)
            .field("folders", &self.folders)
            .field("storage_host", &self.storage_host)
            .finish()
    }
}

impl StorageZone {
    pub fn new(
        name: impl Into<String>,
        access_key: impl Into<String>,
        pull_zone_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            access_key: access_key.into(),
            pull_zone_url: pull_zone_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folders.push(folder.into());
        self
    }

    #[must_use]
    pub fn with_storage_host(mut self, host: impl Into<String>) -> Self {
        self.storage_host = Some(host.into());
        self
    }

    /// A zone needs a name and an access key to accept uploads.
    pub fn is_usable(&self) -> bool {
        !self.name.trim().is_empty() && !self.access_key.trim().is_empty()
    }

    /// The pull zone URL with a scheme and without a trailing slash.
    pub fn delivery_base(&self) -> String {
        with_scheme(&self.pull_zone_url)
    }
}

/// Serve files under `folder` from `domain` instead of the zone's pull URL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomDomain {
    pub folder: String,
    pub domain: String,
}

impl CustomDomain {
    pub fn new(folder: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            domain: domain.into(),
        }
    }
}

/// Configuration for the Bunny Storage provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BunnyConfig {
    /// Storage zones, in routing order.
    pub zones: Vec<StorageZone>,

    /// Zone used when no folder rule matches.
    pub default_zone: Option<String>,

    /// Folder prefix to delivery domain overrides.
    pub custom_domains: Vec<CustomDomain>,

    /// Storage API endpoint shared by zones without their own.
    pub storage_host: String,
}

impl Default for BunnyConfig {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            default_zone: None,
            custom_domains: Vec::new(),
            storage_host: DEFAULT_STORAGE_HOST.to_owned(),
        }
    }
}

impl BunnyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_zone(mut self, zone: StorageZone) -> Self {
        self.zones.push(zone);
        self
    }

    #[must_use]
    pub fn with_default_zone(mut self, name: impl Into<String>) -> Self {
        self.default_zone = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_custom_domain(
        mut self,
        folder: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        self.custom_domains.push(CustomDomain::new(folder, domain));
        self
    }

    /// Override the storage endpoint (useful for testing).
    #[must_use]
    pub fn with_storage_host(mut self, host: impl Into<String>) -> Self {
        self.storage_host = host.into();
        self
    }

    /// At least one zone can accept uploads.
    pub fn is_configured(&self) -> bool {
        self.zones.iter().any(StorageZone::is_usable)
    }

    /// Look up a zone by name.
    pub fn zone(&self, name: &str) -> Option<&StorageZone> {
        self.zones.iter().find(|zone| zone.name == name)
    }

    /// Storage endpoint for `zone`, without a trailing slash.
    pub fn storage_host_for(&self, zone: &StorageZone) -> String {
        let host = zone
            .storage_host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(&self.storage_host);
        with_scheme(host)
    }
}

/// Add `https://` when `url` has no scheme and drop trailing slashes.
pub(crate) fn with_scheme(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_owned()
    } else {
        format!("https://{url}")
    }
}
