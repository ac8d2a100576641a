use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::trace;

use crate::subscription::Subscription;

/// An event that can travel over an [`EventBus`].
///
/// `Kind` is the routing key: listeners subscribe to a kind and receive every
/// published event whose [`BusEvent::kind`] equals it.
pub trait BusEvent: Send + Sync + 'static {
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Listener<E> {
    id: u64,
    handler: Handler<E>,
}

struct Registry<E: BusEvent> {
    listeners: DashMap<E::Kind, Vec<Listener<E>>>,
    next_id: AtomicU64,
}

impl<E: BusEvent> Registry<E> {
    fn remove(&self, kind: E::Kind, id: u64) {
        if let Some(mut listeners) = self.listeners.get_mut(&kind) {
            listeners.retain(|listener| listener.id != id);
        }
        self.listeners
            .remove_if(&kind, |_, listeners| listeners.is_empty());
        trace!(?kind, id, "listener removed");
    }
}

/// Typed publish/subscribe hub.
///
/// Cloning the bus is cheap and every clone shares the same listener
/// registry. Listeners run synchronously inside [`EventBus::publish`], in
/// registration order, without any registry lock held, so a listener may
/// itself publish or (un)subscribe.
pub struct EventBus<E: BusEvent> {
    registry: Arc<Registry<E>>,
}

impl<E: BusEvent> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("kinds", &self.registry.listeners.len())
            .finish()
    }
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                listeners: DashMap::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register `handler` for events of `kind`.
    ///
    /// The listener is removed when the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, kind: E::Kind, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .listeners
            .entry(kind)
            .or_default()
            .push(Listener {
                id,
                handler: Arc::new(handler),
            });
        trace!(?kind, id, "listener registered");

        let registry: Weak<Registry<E>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.remove(kind, id);
            }
        })
    }

    /// Deliver `event` to every listener of its kind. Returns how many
    /// listeners were called.
    pub fn publish(&self, event: &E) -> usize {
        let kind = event.kind();
        let handlers: Vec<Handler<E>> = self
            .registry
            .listeners
            .get(&kind)
            .map(|listeners| {
                listeners
                    .iter()
                    .map(|listener| Arc::clone(&listener.handler))
                    .collect()
            })
            .unwrap_or_default();

        trace!(?kind, listeners = handlers.len(), "publishing event");
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Number of live listeners for `kind`.
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.registry
            .listeners
            .get(&kind)
            .map_or(0, |listeners| listeners.len())
    }

    /// Subscribe with a channel instead of a callback, for async consumers.
    ///
    /// Events are cloned into an unbounded channel. The listener is removed
    /// when the returned [`Subscription`] is dropped, after which the
    /// receiver drains what was already sent and then yields `None`.
    pub fn subscribe_channel(&self, kind: E::Kind) -> (Subscription, mpsc::UnboundedReceiver<E>)
    where
        E: Clone,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(kind, move |event: &E| {
            // The receiver may already be gone; nothing to do then.
            let _ = tx.send(event.clone());
        });
        (subscription, rx)
    }
}
