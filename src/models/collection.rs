//! Ordered in-memory groups of models.

use super::model::Model;
use crate::error::{Result, ValuableError};
use crate::schema::Schema;
use crate::tree::{Struct, TreeOptions};
use crate::types::Raw;

/// Ordered container of models sharing one model name.
#[derive(Debug)]
pub struct Collection {
    path: String,
    schema: Schema,
    options: TreeOptions,
    models: Vec<Model>,
}

impl Collection {
    pub(crate) fn new(path: impl Into<String>, schema: Schema, options: TreeOptions) -> Self {
        Self {
            path: path.into(),
            schema,
            options,
            models: Vec::new(),
        }
    }

    /// Model name of every member.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append a new, uncommitted member built from `attributes`.
    pub fn create(&mut self, attributes: impl Into<Raw>) -> Result<&mut Model> {
        let record = Struct::with_options(self.schema.clone(), attributes, self.options)?;
        self.models.push(Model::new(self.path.clone(), record));
        let last = self.models.len() - 1;
        Ok(&mut self.models[last])
    }

    /// Take the member at `index` out of the collection. It comes back
    /// marked for destroy, so committing it deletes its persisted record.
    pub fn remove(&mut self, index: usize) -> Result<Model> {
        if index >= self.models.len() {
            return Err(ValuableError::IndexOutOfBounds {
                index,
                len: self.models.len(),
            });
        }
        let mut model = self.models.remove(index);
        model.mark_destroy();
        Ok(model)
    }

    pub fn at(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn at_mut(&mut self, index: usize) -> Option<&mut Model> {
        self.models.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Model> {
        self.models.iter()
    }

    /// Members, for passing to `Store::commit`.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Model> {
        self.models.iter_mut()
    }

    /// Mutable view of every member.
    pub fn models_mut(&mut self) -> &mut [Model] {
        &mut self.models
    }

    /// Raw attributes of every member, in order.
    pub fn val(&self) -> Result<Vec<Raw>> {
        self.models.iter().map(|model| model.raw()).collect()
    }
}

impl<'a> IntoIterator for &'a mut Collection {
    type Item = &'a mut Model;
    type IntoIter = std::slice::IterMut<'a, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter_mut()
    }
}
