//! In-memory collection
//!
//! A `Vec`-backed [`Collection`], useful for tests and for small data sets
//! already loaded in memory.

use super::types::{Collection, KeyFilter, Record};
use crate::schema::{KeyPath, SortKey};
use crate::types::KeyValue;
use std::cmp::Ordering;

/// Errors raised by [`MemoryCollection`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("Cannot compare {left} with {right} on \"{path}\"")]
    Incomparable {
        path: String,
        left: String,
        right: String,
    },
}

impl CollectionError {
    fn incomparable(path: &KeyPath, left: &KeyValue, right: &KeyValue) -> Self {
        Self::Incomparable {
            path: path.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

/// Records held in a `Vec`, in collection order
#[derive(Debug, Clone)]
pub struct MemoryCollection<R> {
    records: Vec<R>,
}

impl<R: Record + Clone> MemoryCollection<R> {
    /// Wrap records that are already in collection order
    pub fn from_ordered(records: Vec<R>) -> Self {
        Self { records }
    }

    /// Sort records by `key`, then by id.
    ///
    /// Nulls come first in ascending order and last in descending order.
    pub fn ordered_by(mut records: Vec<R>, key: &SortKey) -> Result<Self, CollectionError> {
        let path = key.attr_path();
        let reverse = key.reverse_order();
        let mut failure = None;

        records.sort_by(|a, b| {
            let (left, right) = (a.value_at(path), b.value_at(path));
            let ordering = left.compare(&right).unwrap_or_else(|| {
                failure.get_or_insert_with(|| CollectionError::incomparable(path, &left, &right));
                Ordering::Equal
            });
            let ordering = if reverse { ordering.reverse() } else { ordering };
            ordering.then_with(|| a.id().cmp(&b.id()))
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(Self { records }),
        }
    }

    /// Records in collection order
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn compare(path: &KeyPath, value: &KeyValue, bound: &KeyValue) -> Result<Ordering, CollectionError> {
    value
        .compare(bound)
        .ok_or_else(|| CollectionError::incomparable(path, value, bound))
}

fn matches(path: &KeyPath, value: &KeyValue, filter: &KeyFilter) -> Result<bool, CollectionError> {
    match filter {
        KeyFilter::IsNull => Ok(value.is_null()),
        KeyFilter::AtLeast(bound) => {
            Ok(!value.is_null() && compare(path, value, bound)? != Ordering::Less)
        }
        KeyFilter::AtMost { value: bound, or_null } => {
            if value.is_null() {
                Ok(*or_null)
            } else {
                Ok(compare(path, value, bound)? != Ordering::Greater)
            }
        }
        KeyFilter::Equal(bound) => {
            Ok(!value.is_null() && compare(path, value, bound)? == Ordering::Equal)
        }
    }
}

impl<R: Record + Clone> Collection for MemoryCollection<R> {
    type Record = R;
    type Error = CollectionError;

    fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.records.len())
    }

    fn filter(&self, path: &KeyPath, filter: &KeyFilter) -> Result<Self, Self::Error> {
        let mut kept = Vec::new();
        for record in &self.records {
            if matches(path, &record.value_at(path), filter)? {
                kept.push(record.clone());
            }
        }
        Ok(Self { records: kept })
    }

    fn reverse(&self) -> Self {
        Self {
            records: self.records.iter().rev().cloned().collect(),
        }
    }

    fn slice(&self, start: usize, stop: usize) -> Result<Vec<R>, Self::Error> {
        let len = self.records.len();
        let start = start.min(len);
        let stop = stop.clamp(start, len);
        Ok(self.records[start..stop].to_vec())
    }
}
