use std::sync::Arc;
use std::time::Duration;

use mediadrop_bunny::BunnyUploader;
use mediadrop_bus::Subscription;
use mediadrop_cloudflare::CloudflareUploader;
use mediadrop_cloudflare_images::CloudflareImagesUploader;
use mediadrop_cloudinary::CloudinaryUploader;
use mediadrop_core::{ProviderKind, UnsupportedProvider};
use mediadrop_provider::{DynUploader, LiveConfig};
use parking_lot::Mutex;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::{MediaBus, MediaEventKind};
use crate::settings::{Settings, SettingsStore};

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error(transparent)]
    UnsupportedProvider(#[from] UnsupportedProvider),
}

struct ActiveUploader {
    kind: ProviderKind,
    timeout: Duration,
    uploader: Arc<dyn DynUploader>,
    subscriptions: Vec<Subscription>,
}

/// Hands out the adapter for the provider named in the settings.
///
/// The adapter is kept while the provider and HTTP timeout stay the same, so
/// repeated calls return the same `Arc`. Any other change first drops every
/// bus subscription of the outgoing adapter, then builds a new one.
pub struct ProviderSelector {
    store: Arc<SettingsStore>,
    bus: MediaBus,
    active: Mutex<Option<ActiveUploader>>,
}

impl std::fmt::Debug for ProviderSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSelector")
            .field("active", &self.current_kind())
            .finish_non_exhaustive()
    }
}

impl ProviderSelector {
    pub fn new(store: Arc<SettingsStore>) -> Self {
        let bus = store.bus().clone();
        Self {
            store,
            bus,
            active: Mutex::new(None),
        }
    }

    /// The adapter for `settings.provider`, building it if needed.
    pub fn get_service(
        &self,
        settings: &Settings,
    ) -> Result<Arc<dyn DynUploader>, SelectorError> {
        let kind = settings.provider_kind()?;
        let timeout = settings.timeout();
        let mut active = self.active.lock();

        if let Some(current) = active.as_ref()
            && current.kind == kind
            && current.timeout == timeout
        {
            return Ok(Arc::clone(&current.uploader));
        }

        if let Some(previous) = active.take() {
            info!(
                from = %previous.kind,
                to = %kind,
                timeout_secs = timeout.as_secs(),
                "rebuilding upload provider"
            );
            drop(previous.subscriptions);
        }

        let uploader = self.build(kind, timeout);
        let subscriptions = vec![self.watch_settings(&uploader)];
        uploader.on_settings_updated();
        debug!(provider = %kind, "upload provider ready");

        *active = Some(ActiveUploader {
            kind,
            timeout,
            uploader: Arc::clone(&uploader),
            subscriptions,
        });
        Ok(uploader)
    }

    /// The adapter currently held, if any.
    pub fn current(&self) -> Option<Arc<dyn DynUploader>> {
        self.active
            .lock()
            .as_ref()
            .map(|active| Arc::clone(&active.uploader))
    }

    pub fn current_kind(&self) -> Option<ProviderKind> {
        self.active.lock().as_ref().map(|active| active.kind)
    }

    /// Release the held adapter and all of its subscriptions.
    pub fn shutdown(&self) {
        if let Some(previous) = self.active.lock().take() {
            debug!(provider = %previous.kind, "releasing upload provider");
        }
    }

    fn build(&self, kind: ProviderKind, timeout: Duration) -> Arc<dyn DynUploader> {
        let client = http_client(timeout);
        let store = Arc::clone(&self.store);
        match kind {
            ProviderKind::CloudflareImages => Arc::new(CloudflareImagesUploader::with_client(
                LiveConfig::from_fn(move || store.snapshot().cloudflare_images.clone()),
                client,
            )),
            ProviderKind::Cloudflare => Arc::new(CloudflareUploader::with_client(
                LiveConfig::from_fn(move || store.snapshot().cloudflare.clone()),
                client,
            )),
            ProviderKind::Bunny => Arc::new(BunnyUploader::with_client(
                LiveConfig::from_fn(move || store.snapshot().bunny.clone()),
                client,
            )),
            ProviderKind::Cloudinary => Arc::new(CloudinaryUploader::with_client(
                LiveConfig::from_fn(move || store.snapshot().cloudinary.clone()),
                client,
            )),
        }
    }

    fn watch_settings(&self, uploader: &Arc<dyn DynUploader>) -> Subscription {
        let weak = Arc::downgrade(uploader);
        self.bus.subscribe(MediaEventKind::SettingsUpdated, move |_| {
            if let Some(uploader) = weak.upgrade() {
                uploader.on_settings_updated();
            }
        })
    }
}

fn http_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        warn!(error = %e, "failed to build HTTP client with timeout, using default");
        Client::new()
    })
}
