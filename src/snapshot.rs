//! Immutable point-in-time views of a store.

use crate::schema::Definition;
use crate::types::{ModelId, Raw};
use im::OrdMap;
use std::sync::Arc;

/// Committed records of one model, keyed by id.
pub type Records = OrdMap<ModelId, Raw>;

/// Persistent map `model name -> id -> raw attributes`.
///
/// Every commit builds a new `Source` by path copying; unchanged subtrees
/// are shared with the previous version.
pub type Source = OrdMap<String, Records>;

/// Identifies the store a snapshot came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StoreTag(pub u64);

/// Anything wrapping a persistent source: a store or one of its snapshots.
pub trait HasSource {
    fn source(&self) -> Arc<Source>;
}

/// Read-only view of one version of a store.
///
/// Cheap to clone. The wrapped source is immutable, so a snapshot never
/// changes, whatever is committed after it was taken.
#[derive(Clone)]
pub struct Snapshot {
    source: Arc<Source>,
    definition: Arc<Definition>,
    version: u64,
    tag: StoreTag,
}

impl Snapshot {
    pub(crate) fn new(source: Arc<Source>, definition: Arc<Definition>, version: u64, tag: StoreTag) -> Self {
        Self {
            source,
            definition,
            version,
            tag,
        }
    }

    /// Raw attributes of `(model, id)`, if committed in this version.
    pub fn get(&self, model: &str, id: &ModelId) -> Option<Raw> {
        self.source.get(model)?.get(id).cloned()
    }

    pub fn contains(&self, model: &str, id: &ModelId) -> bool {
        self.source
            .get(model)
            .map(|records| records.contains_key(id))
            .unwrap_or(false)
    }

    /// Every record of `model`, ordered by id.
    pub fn get_all(&self, model: &str) -> Vec<(ModelId, Raw)> {
        self.source
            .get(model)
            .map(|records| {
                records
                    .iter()
                    .map(|(id, raw)| (id.clone(), raw.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ids committed for `model`, in order.
    pub fn ids(&self, model: &str) -> Vec<ModelId> {
        self.source
            .get(model)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of records of `model`.
    pub fn len(&self, model: &str) -> usize {
        self.source.get(model).map(|records| records.len()).unwrap_or(0)
    }

    /// Version this snapshot was published under. Unique within a store:
    /// restoring republishes an older version, and the next commit continues
    /// after the highest version ever published.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn store_tag(&self) -> StoreTag {
        self.tag
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// The whole snapshot as `{ model: { id: attributes } }`.
    pub fn to_raw(&self) -> Raw {
        let models = self
            .source
            .iter()
            .map(|(model, records)| {
                let records = records
                    .iter()
                    .map(|(id, raw)| (id.0.clone(), raw.clone()))
                    .collect();
                (model.clone(), Raw::Object(records))
            })
            .collect();
        Raw::Object(models)
    }
}

impl HasSource for Snapshot {
    fn source(&self) -> Arc<Source> {
        Arc::clone(&self.source)
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("version", &self.version)
            .field("tag", &self.tag)
            .finish()
    }
}
