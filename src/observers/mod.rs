//! Observer registries for value-tree nodes and the store.
//!
//! Observers are plain callbacks. A registry hands out an `ObserverId` on
//! registration and fires each registered callback at most once per
//! notification, in registration order.
//!
//! # Example
//!
//! ```ignore
//! let mut observers: ObserverSet<dyn Fn(&Raw) + Send + Sync> = ObserverSet::new();
//! let id = observers.register(Arc::new(|raw: &Raw| println!("changed: {raw}")));
//!
//! for observer in observers.listeners() {
//!     observer(&json!(1));
//! }
//!
//! observers.unregister(id);
//! ```

mod registry;

pub use registry::{ObserverSet, RawObserver, SnapshotObserver};
