use std::time::Duration;

use chrono::Utc;
use mediadrop_core::{
    MediaFile, MediaKind, ProviderKind, UploadOptions, UploadRequest, UploadResult,
    normalize_path,
};
use mediadrop_provider::{LiveConfig, UploadError, Uploader};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::{BunnyConfig, StorageZone, with_scheme};
use crate::error::BunnyError;
use crate::routing::{custom_domain_for_path, routing_warnings, select_zone};
use crate::types::StorageResponse;

/// Characters escaped in object paths; `/` separates path segments.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Bunny Storage uploader.
pub struct BunnyUploader {
    config: LiveConfig<BunnyConfig>,
    client: Client,
}

impl BunnyUploader {
    /// Create an uploader with a fixed configuration.
    pub fn new(config: BunnyConfig) -> Self {
        Self::from_live(LiveConfig::fixed(config))
    }

    /// Create an uploader that re-reads `config` on every call.
    pub fn from_live(config: LiveConfig<BunnyConfig>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client, using defaults");
                Client::new()
            });
        Self::with_client(config, client)
    }

    /// Create an uploader with a custom HTTP client.
    pub fn with_client(config: LiveConfig<BunnyConfig>, client: Client) -> Self {
        Self { config, client }
    }

    async fn put_object(
        &self,
        config: &BunnyConfig,
        zone: &StorageZone,
        path: &str,
        file: &MediaFile,
    ) -> Result<(), BunnyError> {
        let url = object_url(config, zone, path);
        debug!(zone = %zone.name, path, bytes = file.len(), "uploading to Bunny Storage");

        let response = self
            .client
            .put(&url)
            .header("AccessKey", &zone.access_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(file.data.clone())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Bunny Storage rate limit hit");
            return Err(BunnyError::RateLimited);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed = StorageResponse::parse_lenient(&body);
        if !status.is_success() || !parsed.reports_success() {
            let detail = parsed.describe().unwrap_or_else(|| format!("HTTP {status}"));
            return Err(BunnyError::Api(detail));
        }
        Ok(())
    }
}

/// Where a file is stored inside its zone.
///
/// An explicit path is used as given. Otherwise the name is prefixed with the
/// upload time in milliseconds, below `folder` (or the folder of the source
/// document) and, for videos, `videos/`.
pub fn object_path(file: &MediaFile, options: &UploadOptions, now_millis: i64) -> String {
    if let Some(path) = non_empty_path(options.path.as_deref()) {
        return path;
    }

    let mut path = String::new();
    let folder = non_empty_path(options.folder.as_deref())
        .or_else(|| options.source_path.as_deref().and_then(document_folder));
    if let Some(folder) = folder {
        path.push_str(&folder);
        path.push('/');
    }
    if file.is_video() {
        path.push_str("videos/");
    }
    let name = normalize_path(&file.name).replace('/', "-");
    path.push_str(&format!("{now_millis}-{name}"));
    path
}

fn non_empty_path(path: Option<&str>) -> Option<String> {
    path.map(normalize_path).filter(|p| !p.is_empty())
}

/// Folder holding the document at `source_path`, if it is not at the root.
fn document_folder(source_path: &str) -> Option<String> {
    normalize_path(source_path)
        .rsplit_once('/')
        .map(|(folder, _)| folder.to_owned())
        .filter(|folder| !folder.is_empty())
}

fn object_url(config: &BunnyConfig, zone: &StorageZone, path: &str) -> String {
    format!(
        "{}/{}/{}",
        config.storage_host_for(zone),
        utf8_percent_encode(&zone.name, NON_ALPHANUMERIC),
        utf8_percent_encode(path, PATH_SEGMENT)
    )
}

/// Split `{zone}/{path}`.
fn split_public_id(public_id: &str) -> Option<(&str, &str)> {
    public_id
        .split_once('/')
        .filter(|(zone, path)| !zone.is_empty() && !path.is_empty())
}

/// Delivery URL for `path` in `zone_name`.
///
/// A matching custom domain beats the zone's pull URL. Unknown zones fall
/// back to the raw storage URL so the result is always well formed.
fn delivery_url(
    config: &BunnyConfig,
    zone_name: &str,
    path: &str,
    class: Option<&str>,
) -> String {
    let encoded = utf8_percent_encode(path, PATH_SEGMENT);
    let domain = custom_domain_for_path(path, &config.custom_domains);
    let base = match (domain, config.zone(zone_name)) {
        (Some(domain), _) => with_scheme(domain),
        (None, Some(zone)) if !zone.pull_zone_url.trim().is_empty() => zone.delivery_base(),
        _ => format!("{}/{zone_name}", with_scheme(&config.storage_host)),
    };
    match class.filter(|c| !c.is_empty()) {
        Some(class) => format!(
            "{base}/{encoded}?class={}",
            utf8_percent_encode(class, NON_ALPHANUMERIC)
        ),
        None => format!("{base}/{encoded}"),
    }
}

impl Uploader for BunnyUploader {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "bunny"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Bunny
    }

    fn is_configured(&self) -> bool {
        self.config.snapshot().is_configured()
    }

    #[instrument(skip(self, request), fields(provider = "bunny", file = %request.file().name))]
    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        let config = self.config.snapshot();
        let (file, options) = request.into_parts();

        let path = object_path(&file, &options, Utc::now().timestamp_millis());
        let route = options.source_path.as_deref().unwrap_or(&path);
        let zone = select_zone(route, &config.zones, config.default_zone.as_deref())?;
        if !zone.is_usable() {
            return Err(BunnyError::NotConfigured(format!(
                "storage zone {:?} has no access key",
                zone.name
            ))
            .into());
        }

        self.put_object(&config, zone, &path, &file).await?;

        let url = delivery_url(&config, &zone.name, &path, options.transformation.as_deref());
        let kind = file.kind().unwrap_or(MediaKind::Image);
        info!(zone = %zone.name, path = %path, "file stored");

        Ok(UploadResult::new(url, format!("{}/{path}", zone.name))
            .with_metadata("media_kind", kind.as_str())
            .with_metadata("storage_zone", zone.name.clone())
            .with_metadata("path", path))
    }

    #[instrument(skip(self), fields(provider = "bunny"))]
    async fn delete(&self, public_id: &str) -> Result<(), UploadError> {
        let config = self.config.snapshot();
        let (zone_name, path) = split_public_id(public_id).ok_or_else(|| {
            BunnyError::InvalidRequest(format!("{public_id:?} is not a {{zone}}/{{path}} id"))
        })?;
        let zone = config
            .zone(zone_name)
            .filter(|zone| zone.is_usable())
            .ok_or_else(|| {
                BunnyError::NotConfigured(format!("storage zone {zone_name:?} is not configured"))
            })?;

        let response = self
            .client
            .delete(object_url(&config, zone, path))
            .header("AccessKey", &zone.access_key)
            .send()
            .await
            .map_err(BunnyError::from)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(public_id, "object already absent");
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = StorageResponse::parse_lenient(&body)
                .describe()
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(BunnyError::Api(detail).into());
        }
        Ok(())
    }

    fn get_url(&self, public_id: &str, transformation: Option<&str>) -> String {
        let config = self.config.snapshot();
        match split_public_id(public_id) {
            Some((zone, path)) => delivery_url(&config, zone, path, transformation),
            None => delivery_url(&config, "", public_id.trim_start_matches('/'), transformation),
        }
    }

    fn on_settings_updated(&self) {
        let config = self.config.snapshot();
        for warning in routing_warnings(&config) {
            warn!(provider = "bunny", "{warning}");
        }
        debug!(zones = config.zones.len(), "Bunny routing table reloaded");
    }
}
