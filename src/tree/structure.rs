//! Keyed composite nodes.

use super::arena::{Arena, NodeData, NodeKind, NodeRef, TreeOptions};
use super::node::{impl_valuable, Node, Valuable};
use crate::error::{Result, ValuableError};
use crate::schema::{FieldType, Schema};
use crate::types::{NodeId, Raw};

/// Observable record whose fields are child nodes, defined by a schema.
///
/// Every declared field exists as a child even when absent from the
/// attributes it was built from; it then holds its type's default.
#[derive(Clone)]
pub struct Struct {
    node: NodeRef,
}

impl_valuable!(Struct);

impl Struct {
    /// Build a struct in strict mode: undeclared attribute keys are a
    /// schema error.
    pub fn new(schema: Schema, attributes: impl Into<Raw>) -> Result<Self> {
        Self::with_options(schema, attributes, TreeOptions::default())
    }

    pub fn with_options(schema: Schema, attributes: impl Into<Raw>, options: TreeOptions) -> Result<Self> {
        let node = NodeRef::new_root(&FieldType::Struct(schema), attributes.into(), options)?;
        Ok(Self { node })
    }

    /// Struct with an open schema mirroring the keys of a plain record.
    pub fn from_record(raw: Raw) -> Result<Self> {
        if !raw.is_object() {
            return Err(ValuableError::InvalidArgument(format!(
                "Struct(): expected a record, got {}",
                raw
            )));
        }
        Self::new(Schema::open(), raw)
    }

    pub(crate) fn from_ref(node: NodeRef) -> Self {
        Self { node }
    }

    /// Schema this struct was built from.
    pub fn schema(&self) -> Result<Schema> {
        self.node.read(|_, data| match &data.kind {
            NodeKind::Struct { schema, .. } => Ok(schema.clone()),
            _ => Err(not_a_struct()),
        })
    }

    /// Field names present on this struct.
    pub fn fields(&self) -> Vec<String> {
        self.node
            .read(|_, data| Ok(children(data)?.iter().map(|(name, _)| name.clone()).collect()))
            .unwrap_or_default()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.node
            .read(|_, data| Ok(children(data)?.iter().any(|(name, _)| name == field)))
            .unwrap_or(false)
    }

    /// Child node for `field`.
    pub fn get(&self, field: &str) -> Result<Node> {
        let child = self.node.read(|_, data| child_id(data, field))?;
        Node::from_ref(self.node.sibling(child))
    }

    /// Raw value of `field`.
    pub fn val_at(&self, field: &str) -> Result<Raw> {
        self.node.read(|_, data| {
            child_id(data, field)?;
            data.raw
                .get(field)
                .cloned()
                .ok_or_else(|| ValuableError::FieldNotFound(field.to_string()))
        })
    }

    /// Replace one field and notify once with the whole record.
    pub fn set(&self, field: &str, raw: impl Into<Raw>) -> Result<()> {
        let raw = raw.into();
        self.node.mutate(|arena, id| set_field(arena, id, field, raw))
    }

    /// Replace one field with a copy of `node`'s value.
    pub fn set_node<V: Valuable>(&self, field: &str, node: &V) -> Result<()> {
        self.set(field, node.val()?)
    }
}

fn not_a_struct() -> ValuableError {
    ValuableError::Structural("struct handle on non-struct node".to_string())
}

fn children(data: &NodeData) -> Result<&[(String, NodeId)]> {
    match &data.kind {
        NodeKind::Struct { children, .. } => Ok(children),
        _ => Err(not_a_struct()),
    }
}

fn child_id(data: &NodeData, field: &str) -> Result<NodeId> {
    children(data)?
        .iter()
        .find(|(name, _)| name == field)
        .map(|(_, id)| *id)
        .ok_or_else(|| ValuableError::FieldNotFound(field.to_string()))
}

fn set_field(arena: &mut Arena, id: NodeId, field: &str, raw: Raw) -> Result<()> {
    let strict = arena.options().strict;
    let ty = match &arena.node(id)?.kind {
        NodeKind::Struct { schema, .. } => schema.resolve(field, strict)?.clone(),
        _ => return Err(not_a_struct()),
    };

    let child = arena.insert(&ty, raw, Some(id))?;
    let child_raw = arena.node(child)?.raw.clone();

    let node = arena.node_mut(id)?;
    let mut old = None;
    if let NodeKind::Struct { children, .. } = &mut node.kind {
        match children.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => old = Some(std::mem::replace(slot, child)),
            None => children.push((field.to_string(), child)),
        }
    }
    if let Some(record) = node.raw.as_object_mut() {
        record.insert(field.to_string(), child_raw);
    }
    if let Some(old) = old {
        arena.release(old);
    }
    Ok(())
}
