//! Collection module
//!
//! The store-side contract of the paginator: an ordered, filterable set of
//! records, plus an in-memory implementation.

mod memory;
mod types;

pub use memory::{CollectionError, MemoryCollection};
pub use types::{Collection, KeyFilter, Record};
