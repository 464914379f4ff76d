//! Schemas for structured nodes and store models.
//!
//! Field types form a closed set: a literal (`Any`, `Str`, `Bool`,
//! `Decimal`, `Integer`), a typed list, or a nested struct schema.
//! Literal validation always runs; definition checks (names, duplicates)
//! and unknown-key rejection only run in strict mode.

mod definition;
mod literal;

pub use definition::{Definition, FieldType, Schema};
pub use literal::LiteralType;
