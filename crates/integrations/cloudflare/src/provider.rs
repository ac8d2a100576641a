use std::time::Duration;

use mediadrop_cloudflare_images::{
    ID_SEGMENT, decode_envelope, delete_image, file_part, post_image,
};
use mediadrop_core::{
    MediaFile, MediaKind, ProviderKind, UploadOptions, UploadRequest, UploadResult,
};
use mediadrop_provider::{LiveConfig, UploadError, Uploader};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use reqwest::multipart::Form;
use tracing::{debug, instrument, warn};

use crate::config::{CloudflareConfig, IMAGE_DELIVERY_DOMAIN};
use crate::error::CloudflareError;
use crate::types::StreamVideo;

/// Cloudflare uploader routing images to Images and videos to Stream.
pub struct CloudflareUploader {
    config: LiveConfig<CloudflareConfig>,
    client: Client,
}

impl CloudflareUploader {
    /// Create an uploader with a fixed configuration.
    pub fn new(config: CloudflareConfig) -> Self {
        Self::from_live(LiveConfig::fixed(config))
    }

    /// Create an uploader that re-reads `config` on every call.
    pub fn from_live(config: LiveConfig<CloudflareConfig>) -> Self {
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
    pub fn with_client(config: LiveConfig<CloudflareConfig>, client: Client) -> Self {
        Self { config, client }
    }

    async fn upload_image(
        &self,
        config: &CloudflareConfig,
        file: &MediaFile,
        options: &UploadOptions,
    ) -> Result<UploadResult, CloudflareError> {
        let images = config.images_config().ok_or_else(|| {
            CloudflareError::NotConfigured("image uploads need an images_token".into())
        })?;

        let image = post_image(&self.client, &images, file, options).await?;
        let id = image.id.unwrap_or_default();
        let url = image_url(config, &id, options.transformation.as_deref());

        Ok(UploadResult::new(url, id).with_metadata("media_kind", MediaKind::Image.as_str()))
    }

    async fn upload_video(
        &self,
        config: &CloudflareConfig,
        file: &MediaFile,
    ) -> Result<UploadResult, CloudflareError> {
        let token = config.stream_token().ok_or_else(|| {
            CloudflareError::NotConfigured("video uploads need a stream_token".into())
        })?;

        debug!(file = %file.name, bytes = file.len(), "uploading to Cloudflare Stream");

        let form = Form::new().part("file", file_part(file)?);
        let response = self
            .client
            .post(config.stream_url())
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Cloudflare Stream rate limit hit");
            return Err(CloudflareError::RateLimited);
        }

        let body = response.text().await?;
        let video: StreamVideo = decode_envelope(status, &body)?;
        let uid = video
            .uid
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| {
                CloudflareError::InvalidResponse("response is missing result.uid".into())
            })?;

        let playback = video.playback.unwrap_or_default();
        let url = playback
            .hls
            .clone()
            .unwrap_or_else(|| video_url(config, &uid, None));
        let (width, height) = video
            .input
            .as_ref()
            .map_or((None, None), |input| input.dimensions());

        let mut result = UploadResult::new(url, MediaKind::Video.tag_public_id(&uid))
            .with_dimensions(width, height)
            .with_metadata("media_kind", MediaKind::Video.as_str())
            .with_metadata("ready_to_stream", video.ready_to_stream);
        if let Some(hls) = playback.hls {
            result = result.with_metadata("hls", hls);
        }
        if let Some(dash) = playback.dash {
            result = result.with_metadata("dash", dash);
        }
        if let Some(thumbnail) = video.thumbnail {
            result = result.with_metadata("thumbnail", thumbnail);
        }
        Ok(result)
    }

    async fn delete_video(
        &self,
        config: &CloudflareConfig,
        uid: &str,
    ) -> Result<(), CloudflareError> {
        let token = config.stream_token().ok_or_else(|| {
            CloudflareError::NotConfigured("video deletion needs a stream_token".into())
        })?;
        let url = format!(
            "{}/{}",
            config.stream_url(),
            utf8_percent_encode(uid, NON_ALPHANUMERIC)
        );

        let response = self.client.delete(&url).bearer_auth(token).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(uid, "video already absent");
            return Ok(());
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CloudflareError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudflareError::Api(format!("HTTP {status}: {body}")));
        }
        Ok(())
    }
}

impl Uploader for CloudflareUploader {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "cloudflare"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Cloudflare
    }

    fn is_configured(&self) -> bool {
        self.config.snapshot().is_configured()
    }

    #[instrument(skip(self, request), fields(provider = "cloudflare", file = %request.file().name))]
    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        let config = self.config.snapshot();
        if !config.is_configured() {
            return Err(CloudflareError::NotConfigured(
                "Cloudflare needs an account_id and an images_token or stream_token".into(),
            )
            .into());
        }

        let (file, options) = request.into_parts();
        let result = match file.kind() {
            Some(MediaKind::Video) => self.upload_video(&config, &file).await?,
            Some(MediaKind::Image) => self.upload_image(&config, &file, &options).await?,
            None => {
                return Err(CloudflareError::InvalidRequest(format!(
                    "{} is neither an image nor a video",
                    file.content_type
                ))
                .into());
            }
        };

        debug!(public_id = %result.public_id, "upload complete");
        Ok(result)
    }

    #[instrument(skip(self), fields(provider = "cloudflare"))]
    async fn delete(&self, public_id: &str) -> Result<(), UploadError> {
        let config = self.config.snapshot();
        match MediaKind::split_public_id(public_id) {
            (MediaKind::Video, uid) => self.delete_video(&config, uid).await?,
            (MediaKind::Image, id) => {
                let images = config.images_config().ok_or_else(|| {
                    CloudflareError::NotConfigured("image deletion needs an images_token".into())
                })?;
                delete_image(&self.client, &images, id)
                    .await
                    .map_err(CloudflareError::from)?;
            }
        }
        Ok(())
    }

    fn get_url(&self, public_id: &str, transformation: Option<&str>) -> String {
        let config = self.config.snapshot();
        match MediaKind::split_public_id(public_id) {
            (MediaKind::Video, uid) => video_url(&config, uid, transformation),
            (MediaKind::Image, id) => image_url(&config, id, transformation),
        }
    }
}

/// Image delivery URL, through the custom domain when one is set.
fn image_url(config: &CloudflareConfig, id: &str, variant: Option<&str>) -> String {
    let variant = variant
        .filter(|v| !v.is_empty())
        .unwrap_or(&config.default_variant);
    let account = config.delivery_account();
    let id = utf8_percent_encode(id, ID_SEGMENT);
    let variant = utf8_percent_encode(variant, ID_SEGMENT);

    match config
        .custom_domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        Some(domain) => {
            let domain = domain.trim_end_matches('/');
            let base = if domain.starts_with("http://") || domain.starts_with("https://") {
                domain.to_owned()
            } else {
                format!("https://{domain}")
            };
            format!("{base}/cdn-cgi/imagedelivery/{account}/{id}/{variant}")
        }
        None => format!("{IMAGE_DELIVERY_DOMAIN}/{account}/{id}/{variant}"),
    }
}

/// Stream playback URL. `dash` and `thumbnail` select the other renditions;
/// anything else yields the HLS manifest.
fn video_url(config: &CloudflareConfig, uid: &str, rendition: Option<&str>) -> String {
    let base = config.stream_domain.trim_end_matches('/');
    let uid = utf8_percent_encode(uid, NON_ALPHANUMERIC);
    match rendition {
        Some("dash") => format!("{base}/{uid}/manifest/video.mpd"),
        Some("thumbnail") => format!("{base}/{uid}/thumbnails/thumbnail.jpg"),
        _ => format!("{base}/{uid}/manifest/video.m3u8"),
    }
}
