use std::time::Duration;

use mediadrop_core::{
    MediaFile, MediaKind, ProviderKind, UploadOptions, UploadRequest, UploadResult,
    normalize_path,
};
use mediadrop_provider::{LiveConfig, UploadError, Uploader};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument, warn};

use crate::config::CloudflareImagesConfig;
use crate::error::CloudflareImagesError;
use crate::types::{ImageResult, decode_envelope};

/// Characters escaped in an image id used as a URL path. Slashes are kept so
/// custom ids like `blog/2024/cover` stay readable.
pub const ID_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Cloudflare Images uploader.
///
/// Reads its configuration from a [`LiveConfig`] on every call, so settings
/// changes take effect without rebuilding the uploader.
pub struct CloudflareImagesUploader {
    config: LiveConfig<CloudflareImagesConfig>,
    client: Client,
}

impl CloudflareImagesUploader {
    /// Create an uploader with a fixed configuration.
    ///
    /// Uses a default `reqwest::Client` with a 30 second timeout.
    pub fn new(config: CloudflareImagesConfig) -> Self {
        Self::from_live(LiveConfig::fixed(config))
    }

    /// Create an uploader that re-reads `config` on every call.
    pub fn from_live(config: LiveConfig<CloudflareImagesConfig>) -> Self {
        Self::with_client(config, default_client())
    }

    /// Create an uploader with a custom HTTP client.
    ///
    /// Useful for testing or for sharing a connection pool across providers.
    pub fn with_client(config: LiveConfig<CloudflareImagesConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn ensure_configured(config: &CloudflareImagesConfig) -> Result<(), CloudflareImagesError> {
        if config.is_configured() {
            Ok(())
        } else {
            Err(CloudflareImagesError::NotConfigured(
                "Cloudflare Images needs an account_id and an api_token".into(),
            ))
        }
    }
}

/// Build a client with the default request timeout, falling back to
/// reqwest's defaults if the TLS backend cannot be initialized.
pub(crate) fn default_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to build HTTP client, using defaults");
            Client::new()
        })
}

/// Build the multipart `file` part for `file`, carrying its name and type.
pub fn file_part(file: &MediaFile) -> Result<Part, CloudflareImagesError> {
    Part::bytes(file.data.to_vec())
        .file_name(file.name.clone())
        .mime_str(&file.content_type)
        .map_err(|e| {
            CloudflareImagesError::InvalidRequest(format!(
                "invalid content type {:?}: {e}",
                file.content_type
            ))
        })
}

/// Upload one image to the Images API of `config`'s account.
///
/// An explicit `options.path` becomes the custom image id; `options.metadata`
/// is attached as the image's JSON metadata.
pub async fn post_image(
    client: &Client,
    config: &CloudflareImagesConfig,
    file: &MediaFile,
    options: &UploadOptions,
) -> Result<ImageResult, CloudflareImagesError> {
    let mut form = Form::new().part("file", file_part(file)?);

    if let Some(path) = options.path.as_deref() {
        let id = normalize_path(path);
        if !id.is_empty() {
            form = form.text("id", id);
        }
    }

    if !options.metadata.is_empty() {
        let metadata = serde_json::to_string(&options.metadata).map_err(|e| {
            CloudflareImagesError::InvalidRequest(format!("metadata is not serializable: {e}"))
        })?;
        form = form.text("metadata", metadata);
    }

    debug!(file = %file.name, bytes = file.len(), "uploading to Cloudflare Images");

    let response = client
        .post(config.images_url())
        .bearer_auth(&config.api_token)
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        warn!("Cloudflare Images rate limit hit");
        return Err(CloudflareImagesError::RateLimited);
    }

    let body = response.text().await?;
    let result: ImageResult = decode_envelope(status, &body)?;

    if result.id.as_deref().is_none_or(str::is_empty) {
        return Err(CloudflareImagesError::InvalidResponse(
            "response is missing result.id".into(),
        ));
    }
    Ok(result)
}

/// Delete an image by id. A 404 counts as success.
pub async fn delete_image(
    client: &Client,
    config: &CloudflareImagesConfig,
    id: &str,
) -> Result<(), CloudflareImagesError> {
    let url = format!(
        "{}/{}",
        config.images_url(),
        utf8_percent_encode(id, ID_SEGMENT)
    );

    let response = client
        .delete(&url)
        .bearer_auth(&config.api_token)
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        debug!(id, "image already absent");
        return Ok(());
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(CloudflareImagesError::RateLimited);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CloudflareImagesError::Api(format!("HTTP {status}: {body}")));
    }
    Ok(())
}

impl Uploader for CloudflareImagesUploader {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "cloudflare-images"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::CloudflareImages
    }

    fn is_configured(&self) -> bool {
        self.config.snapshot().is_configured()
    }

    #[instrument(
        skip(self, request),
        fields(provider = "cloudflare-images", file = %request.file().name)
    )]
    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        let config = self.config.snapshot();
        Self::ensure_configured(&config)?;

        let (file, options) = request.into_parts();
        if file.kind() != Some(MediaKind::Image) {
            return Err(CloudflareImagesError::InvalidRequest(format!(
                "Cloudflare Images only accepts images, got {}",
                file.content_type
            ))
            .into());
        }

        let image = post_image(&self.client, &config, &file, &options).await?;
        let id = image.id.unwrap_or_default();
        let url = delivery_url(&config, &id, options.transformation.as_deref());

        debug!(id = %id, "image uploaded");

        let mut result = UploadResult::new(url, id)
            .with_metadata("media_kind", MediaKind::Image.as_str())
            .with_metadata("variants", image.variants);
        if let Some(filename) = image.filename {
            result = result.with_metadata("filename", filename);
        }
        Ok(result)
    }

    #[instrument(skip(self), fields(provider = "cloudflare-images"))]
    async fn delete(&self, public_id: &str) -> Result<(), UploadError> {
        let config = self.config.snapshot();
        Self::ensure_configured(&config)?;
        delete_image(&self.client, &config, public_id).await?;
        Ok(())
    }

    fn get_url(&self, public_id: &str, transformation: Option<&str>) -> String {
        delivery_url(&self.config.snapshot(), public_id, transformation)
    }
}

/// `{delivery_domain}/{account_id}/{id}/{variant}`.
fn delivery_url(config: &CloudflareImagesConfig, id: &str, variant: Option<&str>) -> String {
    let variant = variant
        .filter(|v| !v.is_empty())
        .unwrap_or(&config.default_variant);
    format!(
        "{}/{}/{}/{}",
        config.delivery_domain.trim_end_matches('/'),
        config.account_id,
        utf8_percent_encode(id, ID_SEGMENT),
        utf8_percent_encode(variant, ID_SEGMENT)
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use mediadrop_core::MediaFile;
    use mediadrop_provider::{DynUploader, UploadError, Uploader};

    use super::*;

    /// A minimal mock HTTP server built on tokio that returns canned responses
    /// and hands back the raw request it received.
    struct MockCloudflareServer {
        listener: tokio::net::TcpListener,
        base_url: String,
    }

    impl MockCloudflareServer {
        async fn start() -> Self {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind mock server");
            let port = listener.local_addr().unwrap().port();
            let base_url = format!("http://127.0.0.1:{port}");
            Self { listener, base_url }
        }

        async fn respond_once(self, status_code: u16, body: &str) -> String {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};

            let (mut stream, _) = self.listener.accept().await.unwrap();

            let mut buf = Vec::new();
            let mut chunk = [0u8; 8192];
            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if request_complete(&buf) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_code} OK\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    fn request_complete(buf: &[u8]) -> bool {
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        if head.contains("transfer-encoding: chunked") {
            return buf.ends_with(b"0\r\n\r\n");
        }
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        buf.len() >= end + 4 + length
    }

    fn png(name: &str) -> MediaFile {
        MediaFile::new(name, "image/png", b"\x89PNG fake".to_vec())
    }

    fn uploader_for(base_url: &str) -> CloudflareImagesUploader {
        CloudflareImagesUploader::new(
            CloudflareImagesConfig::new("acc", "token").with_api_base_url(base_url),
        )
    }

    const SUCCESS: &str = r#"{
        "success":true,"errors":[],"messages":[],
        "result":{
            "id":"img-1","filename":"shot.png",
            "variants":["https://imagedelivery.net/acc/img-1/public"]
        }
    }"#;

    #[test]
    fn provider_name_and_kind() {
        let uploader = CloudflareImagesUploader::new(CloudflareImagesConfig::new("acc", "t"));
        assert_eq!(Uploader::name(&uploader), "cloudflare-images");
        assert_eq!(Uploader::kind(&uploader), ProviderKind::CloudflareImages);
    }

    #[tokio::test]
    async fn upload_success() {
        let server = MockCloudflareServer::start().await;
        let uploader = uploader_for(&server.base_url);

        let server_handle = tokio::spawn(async move { server.respond_once(200, SUCCESS).await });

        let result = Uploader::upload(&uploader, UploadRequest::new(png("shot.png")))
            .await
            .expect("upload should succeed");
        let request = server_handle.await.unwrap();

        assert_eq!(result.public_id, "img-1");
        assert_eq!(result.url, "https://imagedelivery.net/acc/img-1/public");
        assert_eq!(result.metadata_value("media_kind").unwrap(), "image");

        assert!(request.starts_with("POST /accounts/acc/images/v1 "));
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("authorization: bearer token"));
        assert!(request.contains(r#"name="file"; filename="shot.png""#));
    }

    #[tokio::test]
    async fn upload_sends_custom_id_and_metadata() {
        let server = MockCloudflareServer::start().await;
        let uploader = uploader_for(&server.base_url);

        let server_handle = tokio::spawn(async move { server.respond_once(200, SUCCESS).await });

        let options = UploadOptions::default()
            .with_path("/blog\\cover.png")
            .with_metadata("note", "daily")
            .with_transformation("thumb");
        let result = Uploader::upload(
            &uploader,
            UploadRequest::new(png("cover.png")).with_options(options),
        )
        .await
        .unwrap();
        let request = server_handle.await.unwrap();

        assert!(request.contains("name=\"id\"\r\n\r\nblog/cover.png"));
        assert!(request.contains(r#"{"note":"daily"}"#));
        assert_eq!(result.url, "https://imagedelivery.net/acc/img-1/thumb");
    }

    #[tokio::test]
    async fn upload_unconfigured_fails_before_io() {
        let uploader = CloudflareImagesUploader::new(
            CloudflareImagesConfig::new("acc", "").with_api_base_url("http://127.0.0.1:1"),
        );
        let err = Uploader::upload(&uploader, UploadRequest::new(png("a.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn upload_rejects_video() {
        let uploader = uploader_for("http://127.0.0.1:1");
        let video = MediaFile::new("clip.mp4", "video/mp4", b"mp4".to_vec());
        let err = Uploader::upload(&uploader, UploadRequest::new(video))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn upload_rate_limited() {
        let server = MockCloudflareServer::start().await;
        let uploader = uploader_for(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(429, r#"{"success":false,"errors":[]}"#)
                .await
        });

        let err = Uploader::upload(&uploader, UploadRequest::new(png("a.png")))
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(matches!(err, UploadError::RateLimited));
    }

    #[tokio::test]
    async fn upload_api_error_is_rejected() {
        let server = MockCloudflareServer::start().await;
        let uploader = uploader_for(&server.base_url);

        let body =
            r#"{"success":false,"errors":[{"code":5400,"message":"Bad request"}],"result":null}"#;
        let server_handle = tokio::spawn(async move { server.respond_once(400, body).await });

        let err = Uploader::upload(&uploader, UploadRequest::new(png("a.png")))
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(
            matches!(err, UploadError::Rejected(ref m) if m.contains("5400: Bad request"))
        );
    }

    #[tokio::test]
    async fn upload_malformed_body_is_invalid_response() {
        let server = MockCloudflareServer::start().await;
        let uploader = uploader_for(&server.base_url);

        let server_handle =
            tokio::spawn(async move { server.respond_once(200, "<html>oops</html>").await });

        let err = Uploader::upload(&uploader, UploadRequest::new(png("a.png")))
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(matches!(err, UploadError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn upload_missing_id_is_invalid_response() {
        let server = MockCloudflareServer::start().await;
        let uploader = uploader_for(&server.base_url);

        let body = r#"{"success":true,"errors":[],"result":{"variants":[]}}"#;
        let server_handle = tokio::spawn(async move { server.respond_once(200, body).await });

        let err = Uploader::upload(&uploader, UploadRequest::new(png("a.png")))
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(matches!(err, UploadError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn upload_unreachable_is_transport_error() {
        let uploader = uploader_for("http://127.0.0.1:1");
        let err = Uploader::upload(&uploader, UploadRequest::new(png("a.png")))
            .await
            .unwrap_err();
        assert!(
            matches!(err, UploadError::Connection(_) | UploadError::Timeout(_)),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn delete_success() {
        let server = MockCloudflareServer::start().await;
        let uploader = uploader_for(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(200, r#"{"success":true,"errors":[],"result":{}}"#)
                .await
        });

        Uploader::delete(&uploader, "blog/cover").await.unwrap();
        let request = server_handle.await.unwrap();
        assert!(request.starts_with("DELETE /accounts/acc/images/v1/blog/cover "));
    }

    #[tokio::test]
    async fn delete_missing_image_is_ok() {
        let server = MockCloudflareServer::start().await;
        let uploader = uploader_for(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(404, r#"{"success":false,"errors":[]}"#)
                .await
        });

        Uploader::delete(&uploader, "gone").await.unwrap();
        server_handle.await.unwrap();
    }

    #[test]
    fn get_url_uses_default_or_given_variant() {
        let uploader = CloudflareImagesUploader::new(
            CloudflareImagesConfig::new("acc", "t").with_default_variant("blog"),
        );
        assert_eq!(
            Uploader::get_url(&uploader, "img-1", None),
            "https://imagedelivery.net/acc/img-1/blog"
        );
        assert_eq!(
            Uploader::get_url(&uploader, "img-1", Some("thumb")),
            "https://imagedelivery.net/acc/img-1/thumb"
        );
        assert_eq!(
            Uploader::get_url(&uploader, "img-1", Some("")),
            "https://imagedelivery.net/acc/img-1/blog"
        );
    }

    #[test]
    fn get_url_escapes_custom_ids() {
        let uploader = CloudflareImagesUploader::new(CloudflareImagesConfig::new("acc", "t"));
        assert_eq!(
            Uploader::get_url(&uploader, "blog/my cat#1", None),
            "https://imagedelivery.net/acc/blog/my%20cat%231/public"
        );
    }

    #[test]
    fn get_url_custom_delivery_domain() {
        let uploader = CloudflareImagesUploader::new(
            CloudflareImagesConfig::new("acc", "t")
                .with_delivery_domain("https://img.example.com/"),
        );
        assert_eq!(
            Uploader::get_url(&uploader, "x", None),
            "https://img.example.com/acc/x/public"
        );
    }

    #[test]
    fn configuration_is_read_live() {
        let shared = Arc::new(Mutex::new(CloudflareImagesConfig::new("acc", "")));
        let source = Arc::clone(&shared);
        let uploader: Arc<dyn DynUploader> = Arc::new(CloudflareImagesUploader::from_live(
            LiveConfig::from_fn(move || source.lock().unwrap().clone()),
        ));

        assert!(!uploader.is_configured());
        shared.lock().unwrap().api_token = "token".into();
        assert!(uploader.is_configured());
    }
}
