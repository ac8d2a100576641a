use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use mediadrop_core::{
    MediaKind, ProviderKind, UploadOptions, UploadRequest, UploadResult, normalize_path,
};
use mediadrop_provider::{LiveConfig, UploadError, Uploader};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument, warn};

use crate::config::CloudinaryConfig;
use crate::error::CloudinaryError;
use crate::signature::sign;
use crate::types::{DestroyResponse, UploadResponse};

/// Cloudinary uploader.
pub struct CloudinaryUploader {
    config: LiveConfig<CloudinaryConfig>,
    client: Client,
}

impl CloudinaryUploader {
    /// Create an uploader with a fixed configuration.
    pub fn new(config: CloudinaryConfig) -> Self {
        Self::from_live(LiveConfig::fixed(config))
    }

    /// Create an uploader that re-reads `config` on every call.
    pub fn from_live(config: LiveConfig<CloudinaryConfig>) -> Self {
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
    pub fn with_client(config: LiveConfig<CloudinaryConfig>, client: Client) -> Self {
        Self { config, client }
    }
}

/// Escape `|` and `=` inside a context key or value.
fn escape_context(value: &str) -> String {
    value.replace('|', "\\|").replace('=', "\\=")
}

/// All non-file form fields of an upload, including the signature or the
/// upload preset.
pub fn upload_params(
    config: &CloudinaryConfig,
    options: &UploadOptions,
    timestamp: i64,
) -> Result<BTreeMap<String, String>, CloudinaryError> {
    let mut params = BTreeMap::new();
    params.insert("timestamp".to_owned(), timestamp.to_string());

    let folder = options
        .folder
        .as_deref()
        .map(normalize_path)
        .filter(|f| !f.is_empty())
        .or_else(|| config.default_folder().map(normalize_path));
    if let Some(folder) = folder {
        params.insert("folder".to_owned(), folder);
    }
    if let Some(public_id) = options.path.as_deref().map(normalize_path).filter(|p| !p.is_empty()) {
        params.insert("public_id".to_owned(), public_id);
    }
    if !options.tags.is_empty() {
        params.insert("tags".to_owned(), options.tags.join(","));
    }
    if !options.metadata.is_empty() {
        let context = options
            .metadata
            .iter()
            .map(|(k, v)| format!("{}={}", escape_context(k), escape_context(v)))
            .collect::<Vec<_>>()
            .join("|");
        params.insert("context".to_owned(), context);
    }
    if let Some(transformation) = options.transformation.as_deref().filter(|t| !t.is_empty()) {
        params.insert("transformation".to_owned(), transformation.to_owned());
    }

    if let Some(preset) = config.upload_preset() {
        params.insert("upload_preset".to_owned(), preset.to_owned());
        if let Some(api_key) = config.api_key() {
            params.insert("api_key".to_owned(), api_key.to_owned());
        }
    } else if let Some((api_key, secret)) = config.credentials() {
        let signature = sign(&params, secret, config.signature_algorithm);
        params.insert("signature".to_owned(), signature);
        params.insert("api_key".to_owned(), api_key.to_owned());
    } else {
        return Err(CloudinaryError::NotConfigured(
            "Cloudinary needs an upload_preset or an api_key and api_secret".into(),
        ));
    }

    Ok(params)
}

fn parse_upload(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<UploadResponse, CloudinaryError> {
    let response: UploadResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(_) if !status.is_success() => {
            return Err(CloudinaryError::Api(format!("HTTP {status}: {body}")));
        }
        Err(e) => return Err(CloudinaryError::InvalidResponse(format!("malformed JSON: {e}"))),
    };
    if let Some(error) = response.error {
        return Err(CloudinaryError::Api(error.message));
    }
    if !status.is_success() {
        return Err(CloudinaryError::Api(format!("HTTP {status}")));
    }
    Ok(response)
}

/// `{delivery}/{cloud}/{image|video}/upload/{transformation/}{id}`.
fn delivery_url(
    config: &CloudinaryConfig,
    public_id: &str,
    transformation: Option<&str>,
) -> String {
    let (kind, id) = MediaKind::split_public_id(public_id);
    let base = format!(
        "{}/{}/{}/upload",
        config.delivery_base_url.trim_end_matches('/'),
        config.cloud_name,
        kind.as_str()
    );
    match transformation.filter(|t| !t.is_empty()) {
        Some(t) => format!("{base}/{t}/{id}"),
        None => format!("{base}/{id}"),
    }
}

impl Uploader for CloudinaryUploader {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "cloudinary"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Cloudinary
    }

    fn is_configured(&self) -> bool {
        self.config.snapshot().is_configured()
    }

    #[instrument(skip(self, request), fields(provider = "cloudinary", file = %request.file().name))]
    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        let config = self.config.snapshot();
        if config.cloud_name.trim().is_empty() {
            return Err(
                CloudinaryError::NotConfigured("Cloudinary needs a cloud_name".into()).into(),
            );
        }

        let (file, options) = request.into_parts();
        let params = upload_params(&config, &options, Utc::now().timestamp())?;

        let part = Part::bytes(file.data.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| CloudinaryError::InvalidRequest(format!("invalid content type: {e}")))?;
        let form = params
            .into_iter()
            .fold(Form::new().part("file", part), |form, (key, value)| form.text(key, value));

        debug!(file = %file.name, bytes = file.len(), "uploading to Cloudinary");

        let response = self
            .client
            .post(config.endpoint("auto", "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(CloudinaryError::from)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Cloudinary rate limit hit");
            return Err(CloudinaryError::RateLimited.into());
        }
        let body = response.text().await.map_err(CloudinaryError::from)?;
        let uploaded = parse_upload(status, &body)?;

        let (Some(url), Some(public_id)) = (uploaded.secure_url, uploaded.public_id) else {
            return Err(CloudinaryError::InvalidResponse(
                "response is missing secure_url or public_id".into(),
            )
            .into());
        };

        let resource_type = uploaded.resource_type.unwrap_or_else(|| "image".to_owned());
        let kind = if resource_type == "video" {
            MediaKind::Video
        } else {
            MediaKind::Image
        };

        let mut result = UploadResult::new(url, kind.tag_public_id(&public_id))
            .with_dimensions(uploaded.width, uploaded.height)
            .with_metadata("media_kind", kind.as_str())
            .with_metadata("resource_type", resource_type);
        if let Some(format) = uploaded.format {
            result = result.with_format(format);
        }
        if let Some(version) = uploaded.version {
            result = result.with_metadata("version", version);
        }
        if let Some(bytes) = uploaded.bytes {
            result = result.with_metadata("bytes", bytes);
        }

        debug!(public_id = %result.public_id, "upload complete");
        Ok(result)
    }

    #[instrument(skip(self), fields(provider = "cloudinary"))]
    async fn delete(&self, public_id: &str) -> Result<(), UploadError> {
        let config = self.config.snapshot();
        let (api_key, secret) = config.credentials().ok_or_else(|| {
            CloudinaryError::NotConfigured("deleting needs an api_key and api_secret".into())
        })?;

        let (kind, id) = MediaKind::split_public_id(public_id);
        let mut params = BTreeMap::new();
        params.insert("public_id".to_owned(), id.to_owned());
        params.insert("timestamp".to_owned(), Utc::now().timestamp().to_string());
        let signature = sign(&params, secret, config.signature_algorithm);
        params.insert("signature".to_owned(), signature);
        params.insert("api_key".to_owned(), api_key.to_owned());

        let response = self
            .client
            .post(config.endpoint(kind.as_str(), "destroy"))
            .form(&params)
            .send()
            .await
            .map_err(CloudinaryError::from)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CloudinaryError::RateLimited.into());
        }
        let body = response.text().await.map_err(CloudinaryError::from)?;
        let destroyed: DestroyResponse = serde_json::from_str(&body).unwrap_or_default();

        if let Some(error) = destroyed.error {
            return Err(CloudinaryError::Api(error.message).into());
        }
        match destroyed.result.as_deref() {
            Some("ok") => Ok(()),
            Some("not found") => {
                debug!(public_id, "asset already absent");
                Ok(())
            }
            _ if !status.is_success() => {
                Err(CloudinaryError::Api(format!("HTTP {status}: {body}")).into())
            }
            other => Err(CloudinaryError::Api(format!(
                "unexpected destroy result: {}",
                other.unwrap_or("none")
            ))
            .into()),
        }
    }

    fn get_url(&self, public_id: &str, transformation: Option<&str>) -> String {
        delivery_url(&self.config.snapshot(), public_id, transformation)
    }
}
