use std::sync::{Arc, Weak};

use mediadrop_bus::Subscription;
use mediadrop_core::StructuredError;
use mediadrop_provider::{DynUploader, ErrorClassifier, UploadError};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::batch::{BatchReport, is_ignored, upload_batch};
use crate::events::{MediaBus, MediaEvent, MediaEventKind, PasteBatch, UploadFailure};
use crate::selector::{ProviderSelector, SelectorError};
use crate::settings::SettingsStore;

/// Owns the upload lifecycle: picks the adapter for the current settings and
/// runs pasted batches through it.
#[derive(Debug)]
pub struct UploadService {
    store: Arc<SettingsStore>,
    selector: ProviderSelector,
    classifier: ErrorClassifier,
    bus: MediaBus,
}

impl UploadService {
    pub fn new(store: Arc<SettingsStore>, classifier: ErrorClassifier) -> Self {
        let bus = store.bus().clone();
        Self {
            selector: ProviderSelector::new(Arc::clone(&store)),
            store,
            classifier,
            bus,
        }
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// The adapter for the current settings.
    pub fn active_uploader(&self) -> Result<Arc<dyn DynUploader>, StructuredError> {
        let settings = self.store.snapshot();
        self.selector
            .get_service(&settings)
            .map_err(|err| self.selection_error(&err))
    }

    /// Upload a pasted or dropped batch with the current settings snapshot.
    pub async fn handle_paste(&self, batch: PasteBatch) -> BatchReport {
        let settings = self.store.snapshot();
        match self.selector.get_service(&settings) {
            Ok(uploader) => {
                upload_batch(
                    uploader.as_ref(),
                    batch,
                    &settings.ignored_folders,
                    &self.classifier,
                    &self.bus,
                )
                .await
            }
            Err(err) => {
                let has_candidates = batch.files.iter().any(|pasted| {
                    pasted.file.is_media()
                        && !is_ignored(pasted.document_path.as_deref(), &settings.ignored_folders)
                });
                if !has_candidates {
                    return BatchReport::default();
                }
                warn!(error = %err, "cannot select upload provider");
                self.bus.publish(&MediaEvent::MediaUploadError(UploadFailure::batch(
                    self.selection_error(&err),
                )));
                BatchReport {
                    not_configured: true,
                    ..BatchReport::default()
                }
            }
        }
    }

    /// Best-effort removal of a previously uploaded asset.
    pub async fn delete(&self, public_id: &str) -> Result<(), StructuredError> {
        let uploader = self.active_uploader()?;
        uploader.delete(public_id).await.map_err(|err| {
            self.classifier
                .classify(&err)
                .with_context("public_id", public_id)
                .with_context("provider", uploader.name())
        })
    }

    /// Delivery URL for `public_id` under the current provider.
    pub fn url_for(
        &self,
        public_id: &str,
        transformation: Option<&str>,
    ) -> Result<String, StructuredError> {
        Ok(self.active_uploader()?.get_url(public_id, transformation))
    }

    /// Subscribe to paste and settings events.
    ///
    /// Pasted batches are spawned onto the current tokio runtime. Settings
    /// updates re-select the adapter. The service is held weakly, so the
    /// returned handles never keep it alive.
    pub fn attach(self: &Arc<Self>) -> Vec<Subscription> {
        let on_paste: Weak<Self> = Arc::downgrade(self);
        let paste = self.bus.subscribe(MediaEventKind::PasteDetected, move |event| {
            let MediaEvent::PasteDetected(batch) = event else {
                return;
            };
            let Some(service) = on_paste.upgrade() else {
                return;
            };
            match Handle::try_current() {
                Ok(handle) => {
                    let batch = batch.clone();
                    handle.spawn(async move {
                        service.handle_paste(batch).await;
                    });
                }
                Err(err) => warn!(error = %err, "no async runtime, dropping pasted files"),
            }
        });

        let on_settings: Weak<Self> = Arc::downgrade(self);
        let settings = self.bus.subscribe(MediaEventKind::SettingsUpdated, move |event| {
            let MediaEvent::SettingsUpdated(settings) = event else {
                return;
            };
            let Some(service) = on_settings.upgrade() else {
                return;
            };
            match service.selector.get_service(settings) {
                Ok(uploader) => debug!(provider = %uploader.name(), "upload provider reselected"),
                Err(err) => warn!(error = %err, "cannot select upload provider"),
            }
        });

        vec![paste, settings]
    }

    fn selection_error(&self, err: &SelectorError) -> StructuredError {
        self.classifier
            .classify(&UploadError::NotConfigured(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use mediadrop_core::{ErrorKind, MediaFile};

    use crate::events::PastedFile;
    use crate::settings::Settings;

    use super::*;

    fn service(settings: Settings) -> (Arc<UploadService>, MediaBus) {
        let bus = MediaBus::new();
        let store = Arc::new(SettingsStore::new(settings, bus.clone()));
        (Arc::new(UploadService::new(store, ErrorClassifier::new())), bus)
    }

    #[tokio::test]
    async fn unsupported_provider_reports_config_error() {
        let (service, bus) = service(Settings::default().with_provider("imgur"));
        let (_sub, mut rx) = bus.subscribe_channel(MediaEventKind::MediaUploadError);

        let batch = PasteBatch::new(vec![PastedFile::new(MediaFile::new(
            "a.png",
            "image/png",
            b"png".to_vec(),
        ))]);
        let report = service.handle_paste(batch).await;

        assert!(report.not_configured);
        let Some(MediaEvent::MediaUploadError(failure)) = rx.recv().await else {
            panic!("expected an error event");
        };
        assert_eq!(failure.file_name, "unknown");
        assert_eq!(failure.error.kind, ErrorKind::Config);
        assert!(failure.error.message.contains("imgur"));
    }

    #[tokio::test]
    async fn unsupported_provider_with_only_text_is_silent() {
        let (service, bus) = service(Settings::default().with_provider("imgur"));
        let (_sub, mut rx) = bus.subscribe_channel(MediaEventKind::MediaUploadError);
        let batch = PasteBatch::new(vec![PastedFile::new(MediaFile::new(
            "notes.txt",
            "text/plain",
            b"hi".to_vec(),
        ))]);

        let report = service.handle_paste(batch).await;
        assert_eq!(report, BatchReport::default());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn url_for_uses_active_provider() {
        let mut settings = Settings::default().with_provider("cloudinary");
        settings.cloudinary =
            mediadrop_cloudinary::CloudinaryConfig::new("demo").with_upload_preset("p");
        let (service, _bus) = service(settings);
        let url = service.url_for("blog/cat", Some("w_100")).unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/w_100/blog/cat");
    }

    #[test]
    fn settings_update_switches_provider() {
        let (service, _bus) = service(Settings::default().with_provider("bunny"));
        let _subs = service.attach();
        service.active_uploader().unwrap();

        service
            .store
            .update(Settings::default().with_provider("cloudflare"));
        assert_eq!(
            service.selector().current_kind(),
            Some(mediadrop_core::ProviderKind::Cloudflare)
        );
    }

    #[test]
    fn attach_holds_service_weakly() {
        let (service, bus) = service(Settings::default());
        let subs = service.attach();
        assert_eq!(bus.listener_count(MediaEventKind::PasteDetected), 1);
        assert_eq!(Arc::strong_count(&service), 1);
        drop(subs);
        assert_eq!(bus.listener_count(MediaEventKind::PasteDetected), 0);
        assert_eq!(bus.listener_count(MediaEventKind::SettingsUpdated), 0);
    }
}
