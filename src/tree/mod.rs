//! Observable value trees.
//!
//! A tree is made of scalar (`Value`), ordered (`List`) and keyed
//! (`Struct`) nodes. Every node exposes its current raw value through
//! `val()`, notifies observers when it changes, and pushes its new raw value
//! up to every ancestor. One edit fires exactly one notification on each
//! node between the edited node and the root.
//!
//! # Example
//!
//! ```ignore
//! let list = List::from_raw(vec![json!(0), json!([1, 2])]);
//! list.observe(|raw| println!("now {raw}"))?;
//!
//! // prints: now [0,[1,false]]
//! list.get(1)?.into_list()?.get(1)?.set_val(false)?;
//! ```
//!
//! Values handed to a tree are always copied in; a node passed to `push`,
//! `set` or a constructor contributes its current raw value, never itself.

mod arena;
mod list;
mod node;
mod structure;
mod value;

pub use arena::{TreeOptions, DEFAULT_MAX_NOTIFY_DEPTH};
pub use list::List;
pub use node::{Node, Valuable};
pub use structure::Struct;
pub use value::Value;
