#![forbid(unsafe_code)]
//! SQLite backend for the rowchain engine.
//!
//! Each ordered collection is a doubly-linked list embedded in rows:
//! `prev`/`next` columns carry the linkage, the schema guards referential
//! existence, and the list algebra in [`list`] keeps symmetry, head/tail
//! uniqueness, and acyclicity intact across edits. Ordered reads run as a
//! single recursive query, never one round trip per hop.

pub mod engine;
pub mod list;
pub mod queries;
pub mod schema;

pub use engine::SqliteEngine;
