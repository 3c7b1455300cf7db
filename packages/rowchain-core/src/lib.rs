#![forbid(unsafe_code)]
//! Core primitives for ordered per-example child collections persisted as
//! doubly-linked lists embedded in relational rows. This crate stays
//! independent of concrete storage engines so backends can implement the
//! store contract against SQLite or any host that can satisfy it.

pub mod chain;
pub mod ctx;
pub mod error;
pub mod ids;
pub mod model;
pub mod traits;

pub use ctx::{CancelHandle, Ctx};
pub use error::{Error, Result};
pub use ids::{Uid, UidGen, UID_LEN};
pub use model::{ChildDraft, ChildRow, ChildTable, OrderedRow, OrderedScope};
pub use traits::ChildStore;

#[cfg(feature = "serde")]
pub use model::ChildExport;
