//! Struct nodes bound to a store model name.

use crate::error::Result;
use crate::ids::IdGenerator;
use crate::tree::{Struct, Valuable};
use crate::types::{ModelId, Raw};
use serde::de::DeserializeOwned;
use std::ops::Deref;

/// One record of a store model.
///
/// Lives as an in-memory struct node until committed. The id is assigned
/// by the first commit and never changes afterwards. Committing a model
/// marked for destroy removes its persisted counterpart; the model itself
/// stays usable.
#[derive(Debug)]
pub struct Model {
    record: Struct,
    path: String,
    id: Option<ModelId>,
    destroy: bool,
}

impl Model {
    pub(crate) fn new(path: impl Into<String>, record: Struct) -> Self {
        Self {
            record,
            path: path.into(),
            id: None,
            destroy: false,
        }
    }

    /// Model name this record is stored under.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Id assigned by the first commit.
    pub fn id(&self) -> Option<&ModelId> {
        self.id.as_ref()
    }

    pub fn is_committed(&self) -> bool {
        self.id.is_some()
    }

    /// Remove the persisted record on the next commit.
    pub fn mark_destroy(&mut self) {
        self.destroy = true;
    }

    pub fn marked_for_destroy(&self) -> bool {
        self.destroy
    }

    /// Current attributes.
    pub fn raw(&self) -> Result<Raw> {
        self.record.val()
    }

    /// Current attributes deserialized into `T`.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.raw()?)?)
    }

    pub fn as_struct(&self) -> &Struct {
        &self.record
    }

    /// Id for this model, generating one if it has none yet.
    pub(crate) fn ensure_id(&mut self, ids: &dyn IdGenerator) -> ModelId {
        self.id.get_or_insert_with(|| ids.generate()).clone()
    }
}

impl Deref for Model {
    type Target = Struct;

    fn deref(&self) -> &Struct {
        &self.record
    }
}
