//! Node arena and change propagation.
//!
//! Every tree lives in one arena. Composite nodes own the ids of their
//! children; a child only records the id of its parent, so there is no
//! reference cycle. A change to a node rewrites the parent's slot for that
//! child, then the grandparent's slot for the parent, up to the root.
//! Observers are collected along the way and fired by the caller once the
//! arena lock is released.

use crate::error::{Result, ValuableError};
use crate::observers::{ObserverSet, RawObserver};
use crate::schema::{FieldType, LiteralType, Schema};
use crate::types::{NodeId, ObserverId, Raw};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{trace, warn};

/// Default bound on nested notifications (observers that mutate).
pub const DEFAULT_MAX_NOTIFY_DEPTH: usize = 64;

/// Options shared by every node in one tree.
#[derive(Clone, Copy, Debug)]
pub struct TreeOptions {
    /// Reject undeclared struct keys.
    pub strict: bool,

    /// Max nested notification depth before mutations are refused.
    pub max_notify_depth: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            strict: true,
            max_notify_depth: DEFAULT_MAX_NOTIFY_DEPTH,
        }
    }
}

/// Structural kind of a node.
pub(crate) enum NodeKind {
    Scalar {
        literal: LiteralType,
    },
    List {
        of: FieldType,
        children: Vec<NodeId>,
    },
    Struct {
        schema: Schema,
        children: Vec<(String, NodeId)>,
    },
}

impl NodeKind {
    /// Type a replacement value for this node is normalized against.
    fn field_type(&self) -> FieldType {
        match self {
            NodeKind::Scalar { literal } => FieldType::Literal(*literal),
            NodeKind::List { of, .. } => FieldType::List(Box::new(of.clone())),
            NodeKind::Struct { schema, .. } => FieldType::Struct(schema.clone()),
        }
    }

    fn child_ids(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Scalar { .. } => Vec::new(),
            NodeKind::List { children, .. } => children.clone(),
            NodeKind::Struct { children, .. } => children.iter().map(|(_, id)| *id).collect(),
        }
    }
}

/// One node in the arena.
pub(crate) struct NodeData {
    pub(crate) raw: Raw,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) observers: ObserverSet<RawObserver>,
}

/// Observers to fire for one node, with the raw value they receive.
pub(crate) struct Pending {
    observers: Vec<Arc<RawObserver>>,
    raw: Raw,
}

/// Storage for all nodes of a tree.
pub(crate) struct Arena {
    nodes: HashMap<NodeId, NodeData>,
    options: TreeOptions,
    /// Notifications currently being delivered.
    depth: usize,
}

impl Arena {
    pub(crate) fn new(options: TreeOptions) -> Self {
        Self {
            nodes: HashMap::new(),
            options,
            depth: 0,
        }
    }

    pub(crate) fn options(&self) -> TreeOptions {
        self.options
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes.get(&id).ok_or(ValuableError::Destroyed(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes.get_mut(&id).ok_or(ValuableError::Destroyed(id))
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Validate `raw` against `ty` and build the node subtree for it.
    pub(crate) fn insert(&mut self, ty: &FieldType, raw: Raw, parent: Option<NodeId>) -> Result<NodeId> {
        let raw = ty.normalize(raw, self.options.strict)?;
        Ok(self.build(ty, raw, parent))
    }

    /// Insert a root scalar holding `raw` as-is, whatever its shape.
    pub(crate) fn insert_scalar(&mut self, literal: LiteralType, raw: Raw) -> NodeId {
        let id = NodeId::next();
        self.nodes.insert(
            id,
            NodeData {
                raw,
                kind: NodeKind::Scalar { literal },
                parent: None,
                observers: ObserverSet::new(),
            },
        );
        id
    }

    /// Build a subtree from an already-normalized raw value.
    fn build(&mut self, ty: &FieldType, raw: Raw, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::next();

        let kind = match (ty, &raw) {
            (FieldType::Literal(LiteralType::Any), Raw::Array(items)) => {
                let of = FieldType::any();
                let children = items
                    .iter()
                    .map(|item| self.build(&of, item.clone(), Some(id)))
                    .collect();
                NodeKind::List { of, children }
            }
            (FieldType::Literal(LiteralType::Any), Raw::Object(_)) => {
                let schema = Schema::open();
                let children = self.build_fields(&schema, &raw, id);
                NodeKind::Struct { schema, children }
            }
            (FieldType::Literal(literal), _) => NodeKind::Scalar { literal: *literal },
            (FieldType::List(of), _) => {
                let children = match &raw {
                    Raw::Array(items) => items
                        .iter()
                        .map(|item| self.build(of, item.clone(), Some(id)))
                        .collect(),
                    _ => Vec::new(),
                };
                NodeKind::List {
                    of: (**of).clone(),
                    children,
                }
            }
            (FieldType::Struct(schema), _) => {
                let children = self.build_fields(schema, &raw, id);
                NodeKind::Struct {
                    schema: schema.clone(),
                    children,
                }
            }
        };

        self.nodes.insert(
            id,
            NodeData {
                raw,
                kind,
                parent,
                observers: ObserverSet::new(),
            },
        );
        id
    }

    fn build_fields(&mut self, schema: &Schema, raw: &Raw, id: NodeId) -> Vec<(String, NodeId)> {
        let Raw::Object(record) = raw else {
            return Vec::new();
        };

        let mut children = Vec::with_capacity(record.len());
        for (name, ty) in schema.entries() {
            if let Some(value) = record.get(name) {
                children.push((name.to_string(), self.build(ty, value.clone(), Some(id))));
            }
        }
        let untyped = FieldType::any();
        for (name, value) in record {
            if schema.field_type(name).is_none() {
                children.push((name.clone(), self.build(&untyped, value.clone(), Some(id))));
            }
        }
        children
    }

    /// Remove a node and its whole subtree.
    pub(crate) fn release(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.kind.child_ids() {
                self.release(child);
            }
        }
    }

    /// Replace a node's value wholesale. Composite nodes rebuild their
    /// children from `raw`.
    pub(crate) fn replace(&mut self, id: NodeId, raw: Raw) -> Result<()> {
        let ty = self.node(id)?.kind.field_type();

        if let FieldType::Literal(literal) = &ty {
            self.node_mut(id)?.raw = literal.validate(&raw)?;
            return Ok(());
        }
        let raw = ty.normalize(raw, self.options.strict)?;

        // Build the new subtree under a throwaway id, then move its
        // children and raw onto the existing node so the id stays stable.
        let fresh = self.build(&ty, raw, None);
        let Some(fresh) = self.nodes.remove(&fresh) else {
            return Err(ValuableError::Structural(format!("rebuild of {} failed", id)));
        };
        for child in fresh.kind.child_ids() {
            if let Some(child) = self.nodes.get_mut(&child) {
                child.parent = Some(id);
            }
        }

        let old = self.node(id)?.kind.child_ids();
        for child in old {
            self.release(child);
        }

        let node = self.node_mut(id)?;
        node.raw = fresh.raw;
        node.kind = fresh.kind;
        Ok(())
    }

    /// Rewrite `parent`'s slot for `child` with `raw`.
    ///
    /// Scalars have no children, so calling this on one is a structural
    /// error.
    pub(crate) fn update_child(&mut self, parent: NodeId, child: NodeId, raw: Raw) -> Result<()> {
        let node = self.node_mut(parent)?;
        match &node.kind {
            NodeKind::Scalar { .. } => Err(ValuableError::Structural(
                "Value(): cannot have child values".to_string(),
            )),
            NodeKind::List { children, .. } => {
                let index = children.iter().position(|c| *c == child).ok_or_else(|| {
                    ValuableError::Structural(format!("{} is not a child of {}", child, parent))
                })?;
                match node.raw.as_array_mut().and_then(|items| items.get_mut(index)) {
                    Some(slot) => *slot = raw,
                    None => {
                        return Err(ValuableError::Structural(format!(
                            "{} raw out of sync with children",
                            parent
                        )))
                    }
                }
                Ok(())
            }
            NodeKind::Struct { children, .. } => {
                let field = children
                    .iter()
                    .find(|(_, c)| *c == child)
                    .map(|(name, _)| name.clone())
                    .ok_or_else(|| {
                        ValuableError::Structural(format!("{} is not a child of {}", child, parent))
                    })?;
                match node.raw.as_object_mut() {
                    Some(record) => {
                        record.insert(field, raw);
                    }
                    None => {
                        return Err(ValuableError::Structural(format!(
                            "{} raw is not a record",
                            parent
                        )))
                    }
                }
                Ok(())
            }
        }
    }

    /// Push the new raw value of `id` up through its ancestors and collect
    /// the observers to notify, edited node first.
    pub(crate) fn propagate(&mut self, id: NodeId) -> Result<Vec<Pending>> {
        let mut pending = Vec::new();
        let mut current = id;
        let mut level = 0usize;

        loop {
            let node = self.node(current)?;
            if !node.observers.is_empty() {
                pending.push(Pending {
                    observers: node.observers.listeners(),
                    raw: node.raw.clone(),
                });
            }

            let Some(parent) = node.parent else {
                break;
            };
            let raw = node.raw.clone();
            self.update_child(parent, current, raw)?;
            trace!(node = %current, parent = %parent, level, "propagated change");

            current = parent;
            level += 1;
        }

        Ok(pending)
    }

    /// Refuse to start a mutation when too many notifications are nested.
    pub(crate) fn check_depth(&self) -> Result<()> {
        if self.depth >= self.options.max_notify_depth {
            warn!(
                depth = self.depth,
                "notification depth limit reached, refusing mutation"
            );
            return Err(ValuableError::ReentrancyLimit(self.options.max_notify_depth));
        }
        Ok(())
    }
}

/// Shared handle to a node in an arena.
#[derive(Clone)]
pub(crate) struct NodeRef {
    arena: Arc<RwLock<Arena>>,
    id: NodeId,
}

impl NodeRef {
    /// Create a new tree whose root has type `ty`.
    pub(crate) fn new_root(ty: &FieldType, raw: Raw, options: TreeOptions) -> Result<Self> {
        let mut arena = Arena::new(options);
        let id = arena.insert(ty, raw, None)?;
        Ok(Self::from_arena(arena, id))
    }

    /// Create a new tree from a value already normalized for `ty`.
    pub(crate) fn new_normalized(ty: &FieldType, raw: Raw, options: TreeOptions) -> Self {
        let mut arena = Arena::new(options);
        let id = arena.build(ty, raw, None);
        Self::from_arena(arena, id)
    }

    /// Take ownership of a populated arena.
    pub(crate) fn from_arena(arena: Arena, id: NodeId) -> Self {
        Self {
            arena: Arc::new(RwLock::new(arena)),
            id,
        }
    }

    /// Handle to another node in the same arena.
    pub(crate) fn sibling(&self, id: NodeId) -> Self {
        Self {
            arena: Arc::clone(&self.arena),
            id,
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&Arena, &NodeData) -> Result<T>) -> Result<T> {
        let arena = self.arena.read();
        let node = arena.node(self.id)?;
        f(&arena, node)
    }

    /// Run a mutation, propagate it to the root, then fire observers with
    /// the arena unlocked, root first.
    pub(crate) fn mutate<T>(&self, f: impl FnOnce(&mut Arena, NodeId) -> Result<T>) -> Result<T> {
        let (result, pending) = {
            let mut arena = self.arena.write();
            arena.check_depth()?;
            arena.node(self.id)?;
            let result = f(&mut arena, self.id)?;
            let pending = arena.propagate(self.id)?;
            if !pending.is_empty() {
                arena.depth += 1;
            }
            (result, pending)
        };

        if !pending.is_empty() {
            let _guard = DepthGuard {
                arena: &self.arena,
            };
            for entry in pending.iter().rev() {
                for observer in &entry.observers {
                    observer(&entry.raw);
                }
            }
        }

        Ok(result)
    }

    pub(crate) fn observe(&self, observer: Arc<RawObserver>) -> Result<ObserverId> {
        let mut arena = self.arena.write();
        Ok(arena.node_mut(self.id)?.observers.register(observer))
    }

    pub(crate) fn unobserve(&self, id: ObserverId) -> Result<bool> {
        let mut arena = self.arena.write();
        Ok(arena.node_mut(self.id)?.observers.unregister(id))
    }

    /// Release the node and its subtree. Later operations on any handle to
    /// it fail with `Destroyed`.
    pub(crate) fn destroy(&self) {
        let mut arena = self.arena.write();
        if let Ok(node) = arena.node_mut(self.id) {
            node.observers.clear();
            node.parent = None;
            node.raw = Raw::Null;
        }
        arena.release(self.id);
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.arena.read().contains(self.id)
    }
}

/// Decrements the notification depth once delivery finishes, even if an
/// observer panics.
struct DepthGuard<'a> {
    arena: &'a Arc<RwLock<Arena>>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        let mut arena = self.arena.write();
        arena.depth = arena.depth.saturating_sub(1);
    }
}
