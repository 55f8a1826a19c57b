// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # flow-pager
//!
//! Keyset ("flow") pagination for large, consistently ordered collections.
//!
//! Pages are found by filtering on the key value of their boundary
//! (`rank >= 12`) rather than by skipping rows, so a page deep in a listing
//! costs the same as the first one. The price is that only the first, last,
//! next and previous pages can be reached.
//!
//! ## Features
//!
//! - **Duplicate keys**: runs of records sharing a key value may span pages
//! - **Nullable keys**: nulls sort lowest (first ascending, last descending)
//! - **Relation keys**: `user` is extended to `user.username` from the related
//!   model's default ordering
//! - **Opaque tokens**: page positions round-trip through JSON without loss
//!   (ISO-8601 dates, exact decimals)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flow_pager::{KeysetPaginator, MemoryCollection, PageToken, SortKey, FieldType};
//!
//! let key = SortKey::for_field("-rank", FieldType::Integer, true)?;
//! let collection = MemoryCollection::ordered_by(contacts, &key)?;
//! let paginator = KeysetPaginator::counted(collection, key, 25)?;
//!
//! let page = paginator.page(None)?;
//! if let Some(token) = page.next_token()? {
//!     // Send token.encode() to the client, get it back with PageToken::decode()
//!     let next = paginator.page(Some(&token))?;
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  KeysetPaginator::page(token) → Page                          │
//! │  Page::next_token() / previous_token() / info() → PageToken   │
//! └───────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────────┬──────────────┴───────────┬────────────────────┐
//! │    Schema     │        Collection        │       Config       │
//! ├───────────────┼──────────────────────────┼────────────────────┤
//! │ ModelMeta     │ count / filter           │ YAML listings      │
//! │ FieldInfo     │ reverse / slice          │ models             │
//! │ SortKey       │ MemoryCollection         │                    │
//! └───────────────┴──────────────────────────┴────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Key values and field types
pub mod types;

/// Model metadata and key resolution
pub mod schema;

/// Collection contract and in-memory backend
pub mod collection;

/// Keyset paginator, pages and tokens
pub mod pagination;

/// YAML configuration of listings
pub mod config;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use collection::{Collection, CollectionError, KeyFilter, MemoryCollection, Record};
pub use config::{load_config, load_config_from_str, Config, PaginatorConfig};
pub use pagination::{KeysetPaginator, Page, PageKind, PageToken, Pages};
pub use schema::{FieldInfo, FieldKind, FieldMeta, KeyPath, ModelMeta, Schema, SortKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
