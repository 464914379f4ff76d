//! Persisted records and ordered groups of them.
//!
//! A `Model` is a struct node that knows which model name it is stored
//! under, carries an id once committed, and can be marked for deletion.
//! A `Collection` is an ordered, in-memory group of models of one name.

mod collection;
mod model;

pub use collection::Collection;
pub use model::Model;
