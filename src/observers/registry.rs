//! Ordered observer registry.

use crate::snapshot::Snapshot;
use crate::types::{ObserverId, Raw};
use std::sync::Arc;

/// Callback fired with a node's new raw value.
pub type RawObserver = dyn Fn(&Raw) + Send + Sync;

/// Callback fired with the store's newly published snapshot.
pub type SnapshotObserver = dyn Fn(&Snapshot) + Send + Sync;

/// Registered observers, kept in registration order.
pub struct ObserverSet<F: ?Sized> {
    entries: Vec<(ObserverId, Arc<F>)>,
}

impl<F: ?Sized> ObserverSet<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register an observer and return its handle.
    pub fn register(&mut self, observer: Arc<F>) -> ObserverId {
        let id = ObserverId::next();
        self.entries.push((id, observer));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    /// Clone out the current observers so they can be fired without
    /// holding whatever lock guards this registry.
    pub fn listeners(&self) -> Vec<Arc<F>> {
        self.entries.iter().map(|(_, f)| Arc::clone(f)).collect()
    }

    /// Drop every observer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: ?Sized> Default for ObserverSet<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn test_register_unregister() {
        let mut set: ObserverSet<RawObserver> = ObserverSet::new();

        let id = set.register(Arc::new(|_: &Raw| {}));
        assert_eq!(set.len(), 1);

        assert!(set.unregister(id));
        assert!(set.is_empty());
        assert!(!set.unregister(id));
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let mut set: ObserverSet<RawObserver> = ObserverSet::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            set.register(Arc::new(move |_: &Raw| seen.lock().push(tag)));
        }

        for listener in set.listeners() {
            listener(&json!(null));
        }

        assert_eq!(*seen.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unregister_only_removes_matching() {
        let mut set: ObserverSet<RawObserver> = ObserverSet::new();
        let a = set.register(Arc::new(|_: &Raw| {}));
        let b = set.register(Arc::new(|_: &Raw| {}));

        set.unregister(a);
        assert_eq!(set.len(), 1);
        assert!(set.unregister(b));
    }
}
