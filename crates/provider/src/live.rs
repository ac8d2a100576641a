use std::sync::Arc;

/// A source of provider configuration that is read afresh on every call.
///
/// Adapters hold a `LiveConfig` instead of a config value so that settings
/// updates are picked up without rebuilding the adapter, while each operation
/// still works on the one snapshot it took when it started.
pub struct LiveConfig<C> {
    source: Arc<dyn Fn() -> C + Send + Sync>,
}

impl<C> Clone for LiveConfig<C> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<C> std::fmt::Debug for LiveConfig<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveConfig").finish_non_exhaustive()
    }
}

impl<C: Clone + Send + Sync + 'static> LiveConfig<C> {
    /// A source that always yields the same configuration.
    pub fn fixed(config: C) -> Self {
        Self {
            source: Arc::new(move || config.clone()),
        }
    }
}

impl<C> LiveConfig<C> {
    /// A source backed by an arbitrary closure, typically reading a settings
    /// store.
    pub fn from_fn(source: impl Fn() -> C + Send + Sync + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Take a snapshot of the current configuration.
    pub fn snapshot(&self) -> C {
        (self.source)()
    }
}
