//! Scalar nodes.

use super::arena::{Arena, NodeKind, NodeRef, TreeOptions};
use super::node::{impl_valuable, Valuable};
use crate::error::{Result, ValuableError};
use crate::schema::LiteralType;
use crate::types::Raw;

/// Observable scalar. Holds any raw value; a typed scalar validates every
/// value it is given against its literal type.
#[derive(Clone)]
pub struct Value {
    node: NodeRef,
}

impl_valuable!(Value);

impl Value {
    /// Wrap a raw value in an untyped scalar.
    pub fn new(raw: impl Into<Raw>) -> Self {
        let mut arena = Arena::new(TreeOptions::default());
        // Untyped scalars are built directly so arrays and records stay
        // scalar payloads instead of becoming composite nodes.
        let id = arena.insert_scalar(LiteralType::Any, raw.into());
        Self {
            node: NodeRef::from_arena(arena, id),
        }
    }

    /// Scalar restricted to one literal type.
    pub fn typed(literal: LiteralType, raw: impl Into<Raw>) -> Result<Self> {
        let raw = literal.validate(&raw.into())?;
        let mut arena = Arena::new(TreeOptions::default());
        let id = arena.insert_scalar(literal, raw);
        Ok(Self {
            node: NodeRef::from_arena(arena, id),
        })
    }

    /// Take a copy of `node`'s current value.
    pub fn set_node<V: Valuable>(&self, node: &V) -> Result<()> {
        self.set_from(node)
    }

    pub(crate) fn from_ref(node: NodeRef) -> Self {
        Self { node }
    }

    /// Literal type this scalar validates against.
    pub fn literal(&self) -> Result<LiteralType> {
        self.node.read(|_, data| match data.kind {
            NodeKind::Scalar { literal } => Ok(literal),
            _ => Err(ValuableError::Structural(
                "scalar handle on composite node".to_string(),
            )),
        })
    }
}
