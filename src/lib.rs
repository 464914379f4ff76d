//! # Valuable Store
//!
//! Observable value trees backed by a versioned, structurally shared model
//! store.
//!
//! ## Core Concepts
//!
//! - **Values**: Scalar, list and struct nodes wrapping plain JSON data
//! - **Observers**: Every ancestor of an edited node is notified exactly once
//! - **Models**: Struct nodes bound to a declared model name
//! - **Snapshots**: Immutable views of the store, untouched by later commits
//!
//! ## Example
//!
//! ```ignore
//! use valuable_store::{Definition, LiteralType, Schema, Store, Valuable};
//! use serde_json::json;
//!
//! let store = Store::with_definition(
//!     Definition::new().model("Item", Schema::new().field("name", LiteralType::Str)),
//! )?;
//!
//! // Build and edit a model in memory
//! let mut item = store.create("Item", json!({ "name": "a" }))?;
//! item.set("name", "b")?;
//!
//! // Persist it
//! let before = store.snapshot();
//! store.commit([&mut item])?;
//!
//! assert_eq!(store.get("Item", item.id().unwrap()), Some(json!({ "name": "b" })));
//! assert!(!Store::is(&before, &store.snapshot()));
//! ```

pub mod error;
pub mod ids;
pub mod models;
pub mod observers;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod tree;
pub mod types;

// Re-exports
pub use error::{Result, ValuableError};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use models::{Collection, Model};
pub use observers::{ObserverSet, RawObserver, SnapshotObserver};
pub use schema::{Definition, FieldType, LiteralType, Schema};
pub use snapshot::{HasSource, Records, Snapshot, Source, StoreTag};
pub use store::{Store, StoreConfig};
pub use tree::{List, Node, Struct, TreeOptions, Valuable, Value, DEFAULT_MAX_NOTIFY_DEPTH};
pub use types::*;
