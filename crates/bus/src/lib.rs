//! In-process event bus for the mediadrop pipeline.
//!
//! Producers (paste detection, settings updates) and consumers (upload
//! service, editor insertion, error reporting) talk through an
//! [`EventBus`] without knowing about each other. Every listener is owned by
//! a [`Subscription`] handle; dropping the handle unregisters the listener,
//! so registration and removal are always symmetric.
//!
//! ```rust
//! use mediadrop_bus::{BusEvent, EventBus};
//!
//! #[derive(Debug, Clone)]
//! enum Ping { Hello(String) }
//!
//! impl BusEvent for Ping {
//!     type Kind = &'static str;
//!     fn kind(&self) -> Self::Kind { "hello" }
//! }
//!
//! let bus = EventBus::<Ping>::new();
//! let sub = bus.subscribe("hello", |event| println!("{event:?}"));
//! assert_eq!(bus.publish(&Ping::Hello("world".into())), 1);
//! drop(sub);
//! assert_eq!(bus.listener_count("hello"), 0);
//! ```

pub mod bus;
pub mod subscription;

pub use bus::{BusEvent, EventBus};
pub use subscription::Subscription;
