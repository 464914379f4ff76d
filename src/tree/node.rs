//! The shared node capability and the `Node` handle returned by `get`.

use super::arena::{NodeKind, NodeRef};
use super::{List, Struct, Value};
use crate::error::{Result, ValuableError};
use crate::types::{NodeId, ObserverId, Raw};

/// Capability shared by every node kind.
pub trait Valuable {
    /// Process-unique id, assigned at construction.
    fn id(&self) -> NodeId;

    /// Current raw value (a copy, not a live reference).
    fn val(&self) -> Result<Raw>;

    /// Replace the node's value and notify. Composite nodes rebuild their
    /// children from `raw`.
    fn set_val<R: Into<Raw>>(&self, raw: R) -> Result<()>;

    /// Register an observer, fired with the node's new raw value.
    fn observe<F>(&self, observer: F) -> Result<ObserverId>
    where
        F: Fn(&Raw) + Send + Sync + 'static;

    /// Remove an observer. Returns false if it was not registered.
    fn unobserve(&self, id: ObserverId) -> Result<bool>;

    /// Release the node's value, observers, parent link and children.
    /// Every later operation on it fails with `Destroyed`.
    fn destroy(&self);

    fn is_destroyed(&self) -> bool;

    /// Set this node's value from another node's current raw value.
    fn set_from<V: Valuable>(&self, other: &V) -> Result<()> {
        self.set_val(other.val()?)
    }
}

/// Implements `Valuable` and `Debug` for a handle with a `node: NodeRef` field.
macro_rules! impl_valuable {
    ($handle:ident) => {
        impl $crate::tree::Valuable for $handle {
            fn id(&self) -> $crate::types::NodeId {
                self.node.id()
            }

            fn val(&self) -> $crate::error::Result<$crate::types::Raw> {
                self.node.read(|_, data| Ok(data.raw.clone()))
            }

            fn set_val<R: Into<$crate::types::Raw>>(&self, raw: R) -> $crate::error::Result<()> {
                let raw = raw.into();
                self.node.mutate(|arena, id| arena.replace(id, raw))
            }

            fn observe<F>(&self, observer: F) -> $crate::error::Result<$crate::types::ObserverId>
            where
                F: Fn(&$crate::types::Raw) + Send + Sync + 'static,
            {
                self.node.observe(std::sync::Arc::new(observer))
            }

            fn unobserve(
                &self,
                id: $crate::types::ObserverId,
            ) -> $crate::error::Result<bool> {
                self.node.unobserve(id)
            }

            fn destroy(&self) {
                self.node.destroy()
            }

            fn is_destroyed(&self) -> bool {
                !self.node.is_alive()
            }
        }

        impl std::fmt::Debug for $handle {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($handle))
                    .field("id", &self.node.id())
                    .finish()
            }
        }
    };
}

pub(crate) use impl_valuable;

/// A child node of any kind, as returned by `List::get` / `Struct::get`.
#[derive(Clone, Debug)]
pub enum Node {
    Value(Value),
    List(List),
    Struct(Struct),
}

impl Node {
    pub(crate) fn from_ref(node: NodeRef) -> Result<Self> {
        node.read(|_, data| {
            Ok(match data.kind {
                NodeKind::Scalar { .. } => Node::Value(Value::from_ref(node.clone())),
                NodeKind::List { .. } => Node::List(List::from_ref(node.clone())),
                NodeKind::Struct { .. } => Node::Struct(Struct::from_ref(node.clone())),
            })
        })
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Node::Value(_) => "Value",
            Node::List(_) => "List",
            Node::Struct(_) => "Struct",
        }
    }

    pub fn into_value(self) -> Result<Value> {
        match self {
            Node::Value(value) => Ok(value),
            other => Err(ValuableError::Structural(format!(
                "expected Value, found {}",
                other.kind_name()
            ))),
        }
    }

    pub fn into_list(self) -> Result<List> {
        match self {
            Node::List(list) => Ok(list),
            other => Err(ValuableError::Structural(format!(
                "expected List, found {}",
                other.kind_name()
            ))),
        }
    }

    pub fn into_struct(self) -> Result<Struct> {
        match self {
            Node::Struct(record) => Ok(record),
            other => Err(ValuableError::Structural(format!(
                "expected Struct, found {}",
                other.kind_name()
            ))),
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Node::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Node::Struct(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Node::Value(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Node::List(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Node::Struct(_))
    }
}

impl Valuable for Node {
    fn id(&self) -> NodeId {
        match self {
            Node::Value(n) => n.id(),
            Node::List(n) => n.id(),
            Node::Struct(n) => n.id(),
        }
    }

    fn val(&self) -> Result<Raw> {
        match self {
            Node::Value(n) => n.val(),
            Node::List(n) => n.val(),
            Node::Struct(n) => n.val(),
        }
    }

    fn set_val<R: Into<Raw>>(&self, raw: R) -> Result<()> {
        match self {
            Node::Value(n) => n.set_val(raw),
            Node::List(n) => n.set_val(raw),
            Node::Struct(n) => n.set_val(raw),
        }
    }

    fn observe<F>(&self, observer: F) -> Result<ObserverId>
    where
        F: Fn(&Raw) + Send + Sync + 'static,
    {
        match self {
            Node::Value(n) => n.observe(observer),
            Node::List(n) => n.observe(observer),
            Node::Struct(n) => n.observe(observer),
        }
    }

    fn unobserve(&self, id: ObserverId) -> Result<bool> {
        match self {
            Node::Value(n) => n.unobserve(id),
            Node::List(n) => n.unobserve(id),
            Node::Struct(n) => n.unobserve(id),
        }
    }

    fn destroy(&self) {
        match self {
            Node::Value(n) => n.destroy(),
            Node::List(n) => n.destroy(),
            Node::Struct(n) => n.destroy(),
        }
    }

    fn is_destroyed(&self) -> bool {
        match self {
            Node::Value(n) => n.is_destroyed(),
            Node::List(n) => n.is_destroyed(),
            Node::Struct(n) => n.is_destroyed(),
        }
    }
}
