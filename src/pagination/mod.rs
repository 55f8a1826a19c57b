//! Pagination module
//!
//! Keyset ("flow") pagination: a page is the `per_page` records found after
//! (or before) a key value, instead of the records after a row offset.
//!
//! # Overview
//!
//! - `KeysetPaginator` - configured once with a collection, a key and a page size
//! - `Page` - the records of one page, with tokens to its neighbours
//! - `PageToken` - the opaque, JSON-safe position of a page
//!
//! Several records can share a key value, so a boundary is a key value plus
//! the number of records with that value already consumed on one side of it.

mod page;
mod paginator;
mod types;

pub use page::{Page, Pages};
pub use paginator::KeysetPaginator;
pub use types::{PageKind, PageToken};
