//! Ordered composite nodes.

use super::arena::{Arena, NodeData, NodeKind, NodeRef, TreeOptions};
use super::node::{impl_valuable, Node, Valuable};
use crate::error::{Result, ValuableError};
use crate::schema::FieldType;
use crate::types::{NodeId, Raw};

/// Observable ordered list of child nodes.
///
/// Every structural mutation (`set`, `push`, `unshift`, `pop`, `shift`)
/// fires exactly one notification carrying the whole list.
#[derive(Clone)]
pub struct List {
    node: NodeRef,
}

impl_valuable!(List);

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl List {
    /// Empty untyped list.
    pub fn new() -> Self {
        Self::from_raw(Vec::new())
    }

    /// Untyped list wrapping `items`. Arrays become nested lists, records
    /// become structs, everything else a scalar.
    pub fn from_raw(items: Vec<Raw>) -> Self {
        let node = NodeRef::new_normalized(
            &FieldType::list_of(FieldType::any()),
            Raw::Array(items),
            TreeOptions::default(),
        );
        Self { node }
    }

    /// Untyped list from any raw value. `null` gives an empty list; anything
    /// other than an array is rejected.
    pub fn try_from_raw(raw: Raw) -> Result<Self> {
        Self::with_options(FieldType::any(), raw, TreeOptions::default())
    }

    /// Untyped list holding a copy of each node's current value.
    pub fn from_nodes<V: Valuable>(nodes: &[V]) -> Result<Self> {
        let items = nodes.iter().map(|n| n.val()).collect::<Result<Vec<_>>>()?;
        Ok(Self::from_raw(items))
    }

    /// Empty list whose elements must all have type `of`.
    pub fn of(of: impl Into<FieldType>) -> Self {
        let node = NodeRef::new_normalized(
            &FieldType::list_of(of),
            Raw::Array(Vec::new()),
            TreeOptions::default(),
        );
        Self { node }
    }

    /// Typed list populated from `raw`.
    pub fn of_raw(of: impl Into<FieldType>, raw: Raw) -> Result<Self> {
        Self::with_options(of.into(), raw, TreeOptions::default())
    }

    /// Typed list with explicit tree options.
    pub fn with_options(of: FieldType, raw: Raw, options: TreeOptions) -> Result<Self> {
        let node = NodeRef::new_root(&FieldType::List(Box::new(of)), raw, options)?;
        Ok(Self { node })
    }

    pub(crate) fn from_ref(node: NodeRef) -> Self {
        Self { node }
    }

    /// Element type of this list.
    pub fn element_type(&self) -> Result<FieldType> {
        self.node.read(|_, data| match &data.kind {
            NodeKind::List { of, .. } => Ok(of.clone()),
            _ => Err(not_a_list()),
        })
    }

    /// Number of children. A destroyed list is empty.
    pub fn len(&self) -> usize {
        self.node
            .read(|_, data| Ok(children(data)?.len()))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Child node at `index`.
    pub fn get(&self, index: usize) -> Result<Node> {
        let child = self.node.read(|_, data| {
            let children = children(data)?;
            children
                .get(index)
                .copied()
                .ok_or(ValuableError::IndexOutOfBounds {
                    index,
                    len: children.len(),
                })
        })?;
        Node::from_ref(self.node.sibling(child))
    }

    /// Raw value of the child at `index`.
    pub fn val_at(&self, index: usize) -> Result<Raw> {
        self.node.read(|_, data| {
            let len = children(data)?.len();
            data.raw
                .as_array()
                .and_then(|items| items.get(index))
                .cloned()
                .ok_or(ValuableError::IndexOutOfBounds { index, len })
        })
    }

    /// Handles to every child, in order.
    pub fn nodes(&self) -> Result<Vec<Node>> {
        let ids = self.node.read(|_, data| Ok(children(data)?.to_vec()))?;
        ids.into_iter()
            .map(|id| Node::from_ref(self.node.sibling(id)))
            .collect()
    }

    /// Replace the child at `index`. Setting `index == len()` appends.
    pub fn set(&self, index: usize, raw: impl Into<Raw>) -> Result<()> {
        let raw = raw.into();
        self.node.mutate(|arena, id| replace_at(arena, id, index, raw))
    }

    /// Replace the child at `index` with a copy of `node`'s value.
    pub fn set_node<V: Valuable>(&self, index: usize, node: &V) -> Result<()> {
        self.set(index, node.val()?)
    }

    /// Append a child.
    pub fn push(&self, raw: impl Into<Raw>) -> Result<()> {
        let raw = raw.into();
        self.node.mutate(|arena, id| {
            let len = children(arena.node(id)?)?.len();
            insert_at(arena, id, len, raw)
        })
    }

    pub fn push_node<V: Valuable>(&self, node: &V) -> Result<()> {
        self.push(node.val()?)
    }

    /// Prepend a child.
    pub fn unshift(&self, raw: impl Into<Raw>) -> Result<()> {
        let raw = raw.into();
        self.node.mutate(|arena, id| insert_at(arena, id, 0, raw))
    }

    pub fn unshift_node<V: Valuable>(&self, node: &V) -> Result<()> {
        self.unshift(node.val()?)
    }

    /// Remove the last child and return its raw value. An empty list
    /// returns `None` and does not notify.
    pub fn pop(&self) -> Result<Option<Raw>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.node.mutate(|arena, id| {
            let len = children(arena.node(id)?)?.len();
            remove_at(arena, id, len.saturating_sub(1))
        })
    }

    /// Remove the first child and return its raw value. An empty list
    /// returns `None` and does not notify.
    pub fn shift(&self) -> Result<Option<Raw>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.node.mutate(|arena, id| remove_at(arena, id, 0))
    }
}

fn not_a_list() -> ValuableError {
    ValuableError::Structural("list handle on non-list node".to_string())
}

fn children(data: &NodeData) -> Result<&[NodeId]> {
    match &data.kind {
        NodeKind::List { children, .. } => Ok(children),
        _ => Err(not_a_list()),
    }
}

fn element_type(arena: &Arena, id: NodeId) -> Result<(FieldType, usize)> {
    match &arena.node(id)?.kind {
        NodeKind::List { of, children } => Ok((of.clone(), children.len())),
        _ => Err(not_a_list()),
    }
}

fn insert_at(arena: &mut Arena, id: NodeId, index: usize, raw: Raw) -> Result<()> {
    let (of, len) = element_type(arena, id)?;
    if index > len {
        return Err(ValuableError::IndexOutOfBounds { index, len });
    }

    let child = arena.insert(&of, raw, Some(id))?;
    let child_raw = arena.node(child)?.raw.clone();

    let node = arena.node_mut(id)?;
    if let NodeKind::List { children, .. } = &mut node.kind {
        children.insert(index, child);
    }
    if let Some(items) = node.raw.as_array_mut() {
        items.insert(index, child_raw);
    }
    Ok(())
}

fn replace_at(arena: &mut Arena, id: NodeId, index: usize, raw: Raw) -> Result<()> {
    let (of, len) = element_type(arena, id)?;
    if index == len {
        return insert_at(arena, id, index, raw);
    }
    if index > len {
        return Err(ValuableError::IndexOutOfBounds { index, len });
    }

    let child = arena.insert(&of, raw, Some(id))?;
    let child_raw = arena.node(child)?.raw.clone();

    let node = arena.node_mut(id)?;
    let mut old = None;
    if let NodeKind::List { children, .. } = &mut node.kind {
        old = Some(std::mem::replace(&mut children[index], child));
    }
    if let Some(slot) = node.raw.as_array_mut().and_then(|items| items.get_mut(index)) {
        *slot = child_raw;
    }
    if let Some(old) = old {
        arena.release(old);
    }
    Ok(())
}

fn remove_at(arena: &mut Arena, id: NodeId, index: usize) -> Result<Option<Raw>> {
    let (_, len) = element_type(arena, id)?;
    if index >= len {
        return Ok(None);
    }

    let node = arena.node_mut(id)?;
    let mut removed = None;
    if let NodeKind::List { children, .. } = &mut node.kind {
        removed = Some(children.remove(index));
    }
    let raw = node
        .raw
        .as_array_mut()
        .filter(|items| index < items.len())
        .map(|items| items.remove(index));

    if let Some(child) = removed {
        arena.release(child);
    }
    Ok(raw)
}
