use async_trait::async_trait;
use mediadrop_core::{ProviderKind, UploadRequest, UploadResult};

use crate::error::UploadError;

/// Strongly-typed upload provider trait with native `async fn`.
///
/// This trait is **not** object-safe because it uses native `async fn` methods
/// (which desugar to opaque `impl Future` return types). If you need dynamic
/// dispatch, use [`DynUploader`] instead -- every `Uploader` automatically
/// implements `DynUploader` via a blanket implementation.
///
/// Implementations must re-read their configuration on every call and must
/// not keep per-upload mutable state, so independent files can be uploaded
/// concurrently through one shared instance.
pub trait Uploader: Send + Sync {
    /// Returns the unique name of this provider.
    fn name(&self) -> &str;

    /// Which backend this uploader talks to.
    fn kind(&self) -> ProviderKind;

    /// Whether the current settings hold everything needed to upload.
    fn is_configured(&self) -> bool;

    /// Upload a single file.
    fn upload(
        &self,
        request: UploadRequest,
    ) -> impl std::future::Future<Output = Result<UploadResult, UploadError>> + Send;

    /// Delete a previously uploaded asset. Callers treat failures as
    /// non-fatal.
    fn delete(
        &self,
        public_id: &str,
    ) -> impl std::future::Future<Output = Result<(), UploadError>> + Send;

    /// Derive the delivery URL for `public_id` without any network call.
    fn get_url(&self, public_id: &str, transformation: Option<&str>) -> String;

    /// Called after every settings update while this uploader is active.
    ///
    /// The default implementation does nothing.
    fn on_settings_updated(&self) {}
}

/// Object-safe uploader trait for use behind `Arc<dyn DynUploader>`.
///
/// Uses [`macro@async_trait`] to enable dynamic dispatch of async methods.
/// You generally should not implement this trait directly -- instead implement
/// [`Uploader`] and rely on the blanket implementation.
#[async_trait]
pub trait DynUploader: Send + Sync {
    /// Returns the unique name of this provider.
    fn name(&self) -> &str;

    /// Which backend this uploader talks to.
    fn kind(&self) -> ProviderKind;

    /// Whether the current settings hold everything needed to upload.
    fn is_configured(&self) -> bool;

    /// Upload a single file.
    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError>;

    /// Delete a previously uploaded asset.
    async fn delete(&self, public_id: &str) -> Result<(), UploadError>;

    /// Derive the delivery URL for `public_id`.
    fn get_url(&self, public_id: &str, transformation: Option<&str>) -> String;

    /// Called after every settings update while this uploader is active.
    fn on_settings_updated(&self) {}
}

/// Blanket implementation: any type that implements [`Uploader`] also
/// implements [`DynUploader`], bridging the static and dynamic dispatch worlds.
#[async_trait]
impl<T: Uploader + Sync> DynUploader for T {
    fn name(&self) -> &str {
        Uploader::name(self)
    }

    fn kind(&self) -> ProviderKind {
        Uploader::kind(self)
    }

    fn is_configured(&self) -> bool {
        Uploader::is_configured(self)
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        Uploader::upload(self, request).await
    }

    async fn delete(&self, public_id: &str) -> Result<(), UploadError> {
        Uploader::delete(self, public_id).await
    }

    fn get_url(&self, public_id: &str, transformation: Option<&str>) -> String {
        Uploader::get_url(self, public_id, transformation)
    }

    fn on_settings_updated(&self) {
        Uploader::on_settings_updated(self);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mediadrop_core::MediaFile;

    use super::*;

    /// A mock uploader for testing the trait and blanket impl.
    struct MockUploader {
        configured: bool,
        should_fail: bool,
    }

    impl MockUploader {
        fn new(configured: bool, should_fail: bool) -> Self {
            Self {
                configured,
                should_fail,
            }
        }
    }

    impl Uploader for MockUploader {
        #[allow(clippy::unnecessary_literal_bound)]
        fn name(&self) -> &str {
            "mock"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Bunny
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
            if self.should_fail {
                return Err(UploadError::Rejected("mock failure".into()));
            }
            let id = request.file().name.clone();
            Ok(UploadResult::new(Uploader::get_url(self, &id, None), id))
        }

        async fn delete(&self, _public_id: &str) -> Result<(), UploadError> {
            if self.should_fail {
                return Err(UploadError::Connection("mock unreachable".into()));
            }
            Ok(())
        }

        fn get_url(&self, public_id: &str, transformation: Option<&str>) -> String {
            match transformation {
                Some(t) => format!("https://mock.example/{t}/{public_id}"),
                None => format!("https://mock.example/{public_id}"),
            }
        }
    }

    fn png(name: &str) -> UploadRequest {
        UploadRequest::new(MediaFile::new(name, "image/png", b"png".to_vec()))
    }

    #[tokio::test]
    async fn uploader_upload_success() {
        let uploader = MockUploader::new(true, false);
        let result = Uploader::upload(&uploader, png("a.png")).await.unwrap();
        assert_eq!(result.public_id, "a.png");
        assert_eq!(result.url, "https://mock.example/a.png");
    }

    #[tokio::test]
    async fn uploader_upload_failure() {
        let uploader = MockUploader::new(true, true);
        let err = Uploader::upload(&uploader, png("a.png")).await.unwrap_err();
        assert!(matches!(err, UploadError::Rejected(_)));
    }

    #[tokio::test]
    async fn blanket_dyn_uploader_impl() {
        let uploader: Arc<dyn DynUploader> = Arc::new(MockUploader::new(true, false));
        assert_eq!(uploader.name(), "mock");
        assert_eq!(uploader.kind(), ProviderKind::Bunny);
        assert!(uploader.is_configured());

        let result = uploader.upload(png("b.png")).await.unwrap();
        assert_eq!(
            uploader.get_url(&result.public_id, Some("thumb")),
            "https://mock.example/thumb/b.png"
        );

        uploader.delete(&result.public_id).await.unwrap();
        uploader.on_settings_updated();
    }

    #[tokio::test]
    async fn dyn_uploader_delete_failure() {
        let uploader: Arc<dyn DynUploader> = Arc::new(MockUploader::new(false, true));
        assert!(!uploader.is_configured());
        let err = uploader.delete("x").await.unwrap_err();
        assert!(matches!(err, UploadError::Connection(_)));
    }
}
