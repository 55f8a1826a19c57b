//! Collection types and traits
//!
//! Defines the contract a data store must fulfil to be paginated.

use crate::schema::KeyPath;
use crate::types::KeyValue;

/// Range predicate on the key of a collection
#[derive(Debug, Clone, PartialEq)]
pub enum KeyFilter {
    /// key IS NULL
    IsNull,
    /// key >= value (never matches null keys)
    AtLeast(KeyValue),
    /// key <= value, optionally OR key IS NULL
    AtMost { value: KeyValue, or_null: bool },
    /// key == value (never matches null keys)
    Equal(KeyValue),
}

impl KeyFilter {
    /// Filter selecting the records whose key equals `value`, null included
    pub fn same_as(value: &KeyValue) -> Self {
        if value.is_null() {
            Self::IsNull
        } else {
            Self::Equal(value.clone())
        }
    }
}

/// A record that can be paginated
pub trait Record {
    /// Unique identifier, used as the final tiebreak of every ordering
    type Id: Ord;

    /// Get the unique identifier
    fn id(&self) -> Self::Id;

    /// Extract the key value at `path`, following relations.
    ///
    /// A null relation anywhere on the path yields [`KeyValue::Null`].
    fn value_at(&self, path: &KeyPath) -> KeyValue;
}

/// An ordered, filterable set of records
///
/// The order is fixed when the collection is built and must end with a
/// unique tiebreak. Nulls must sort lowest in ascending order (highest in
/// descending order). Filtering and reversing keep that order.
pub trait Collection: Clone {
    /// Record type
    type Record: Record;

    /// Errors raised by the store; passed through untouched by the paginator
    type Error: std::error::Error + Send + Sync + 'static;

    /// Total number of records
    fn count(&self) -> Result<usize, Self::Error>;

    /// Records matching `filter` on the key at `path`, in the same order
    fn filter(&self, path: &KeyPath, filter: &KeyFilter) -> Result<Self, Self::Error>;

    /// The same records in exactly reversed order
    fn reverse(&self) -> Self;

    /// Records at positions `start..stop` (clamped to the collection size)
    fn slice(&self, start: usize, stop: usize) -> Result<Vec<Self::Record>, Self::Error>;
}
