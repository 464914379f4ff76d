//! Id generation for committed models.

use crate::types::ModelId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of globally unique model ids.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> ModelId;
}

/// Random v4 UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> ModelId {
        ModelId(uuid::Uuid::new_v4().to_string())
    }
}

/// Deterministic ids (`prefix1`, `prefix2`, ...), for tests.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> ModelId {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        ModelId(format!("{}{}", self.prefix, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids = UuidGenerator;
        assert_ne!(ids.generate(), ids.generate());
        assert_eq!(ids.generate().as_str().len(), 36);
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("item");
        assert_eq!(ids.generate(), ModelId::from("item1"));
        assert_eq!(ids.generate(), ModelId::from("item2"));
    }
}
