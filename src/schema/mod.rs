//! Schema module
//!
//! Describes record types so pagination keys can be validated up front.
//!
//! # Overview
//!
//! - `Schema` - registry of `ModelMeta`, built explicitly and passed by reference
//! - `FieldInfo` - the fields traversed by a dotted key path
//! - `SortKey` - a validated key: direction, effective path, nullability, value type
//!
//! Keys may go through to-one relations (`user.username`); a key ending on a
//! relation is extended by the related model's default ordering. Many-to-many
//! relations are rejected.

mod resolve;
mod types;

pub use resolve::{FieldInfo, KeyPath, SortKey, PATH_SEPARATOR};
pub use types::{FieldKind, FieldMeta, ModelMeta, Schema};
