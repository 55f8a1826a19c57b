//! Keyset paginator
//!
//! Pages are located by key value plus a tiebreak offset instead of a row
//! offset, so the cost of a page does not depend on its depth. Only the next
//! and previous pages (plus the first and last ones) are reachable.
//!
//! Consistency is weak: if the collection changes between two `page()` calls,
//! records around the boundary may be skipped or shown twice.

use super::page::{Page, Pages};
use super::types::{PageKind, PageToken};
use crate::collection::{Collection, KeyFilter};
use crate::config::PaginatorConfig;
use crate::error::{Error, Result};
use crate::schema::{Schema, SortKey};
use crate::types::KeyValue;
use tracing::debug;

/// Paginates a [`Collection`] along a [`SortKey`]
///
/// Immutable once built. The collection must be ordered by the key first and
/// by a unique field last; with a nullable key, nulls must come first in
/// ascending order and last in descending order.
#[derive(Debug, Clone)]
pub struct KeysetPaginator<C> {
    collection: C,
    key: SortKey,
    per_page: usize,
    count: usize,
}

impl<C: Collection> KeysetPaginator<C> {
    /// Create a paginator.
    ///
    /// `count` is the size of the collection, given by the caller so it is
    /// not queried again. `per_page` must be greater than 1.
    pub fn new(collection: C, key: SortKey, per_page: usize, count: usize) -> Result<Self> {
        if per_page <= 1 {
            return Err(Error::config(format!(
                "per_page must be greater than 1 (got {per_page})"
            )));
        }

        Ok(Self {
            collection,
            key,
            per_page,
            count,
        })
    }

    /// Create a paginator, counting the collection
    pub fn counted(collection: C, key: SortKey, per_page: usize) -> Result<Self> {
        let count = collection.count().map_err(Error::collection)?;
        Self::new(collection, key, per_page, count)
    }

    /// Create a paginator from a listing configuration
    pub fn from_config(
        collection: C,
        schema: &Schema,
        config: &PaginatorConfig,
        count: usize,
    ) -> Result<Self> {
        config.validate()?;
        let key = SortKey::resolve(schema, &config.model, &config.key)?;
        Self::new(collection, key, config.per_page, count)
    }

    /// The paginated collection
    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// The key, as carried by tokens (including any `-` marker)
    pub fn key(&self) -> &str {
        self.key.key()
    }

    /// The resolved sort key
    pub fn sort_key(&self) -> &SortKey {
        &self.key
    }

    /// Whether the key is in descending order
    pub fn reverse_order(&self) -> bool {
        self.key.reverse_order()
    }

    /// Maximum number of records per page
    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Total number of records, as given at construction
    pub fn count(&self) -> usize {
        self.count
    }

    /// Get the last page
    pub fn last_page(&self) -> Result<Page<'_, C>> {
        self.page(Some(&PageToken::last(self.key.key())))
    }

    /// Iterate over all pages, from the first one
    pub fn pages(&self) -> Pages<'_, C> {
        Pages::new(self)
    }

    /// Get the page described by `token`; `None` means the first page.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` if the token does not belong to this paginator or is malformed
    /// - `EndOfSequence` if a forward token points past the last record
    /// - `StartOfSequence` if a backward token reaches the first page (which
    ///   should then be fetched with `None`)
    /// - `Collection` for any error of the underlying store
    pub fn page(&self, token: Option<&PageToken>) -> Result<Page<'_, C>> {
        let token = match token {
            Some(token) if token.kind != PageKind::First && self.count > self.per_page => token,
            _ => return self.first(),
        };

        self.check_key(token)?;

        let page = match token.kind {
            PageKind::First => self.first(),
            PageKind::Last => self.last(),
            PageKind::Forward => self.forward(token),
            PageKind::Backward => self.backward(token),
        }?;

        debug!(
            kind = %token.kind,
            key = self.key.key(),
            offset = token.offset,
            size = page.len(),
            has_next = page.has_next(),
            "Fetched page"
        );

        Ok(page)
    }

    fn first(&self) -> Result<Page<'_, C>> {
        let mut records = self
            .collection
            .slice(0, self.per_page.saturating_add(1))
            .map_err(Error::collection)?;
        let next_item = if records.len() > self.per_page {
            records.pop()
        } else {
            None
        };

        debug!(key = self.key.key(), size = records.len(), "Fetched first page");
        Ok(Page::new(self, records, true, 0, next_item, true))
    }

    fn last(&self) -> Result<Page<'_, C>> {
        let mut records = self
            .collection
            .reverse()
            .slice(0, self.per_page)
            .map_err(Error::collection)?;
        records.reverse();

        Ok(Page::new(self, records, false, 0, None, false))
    }

    fn forward(&self, token: &PageToken) -> Result<Page<'_, C>> {
        let value = self.boundary_value(token)?;
        let offset = token.offset;
        let view = self.filtered(&value, self.key.reverse_order())?;

        let mut records = view
            .slice(offset, offset.saturating_add(self.per_page.saturating_add(1)))
            .map_err(Error::collection)?;
        let next_item = if records.len() > self.per_page {
            records.pop()
        } else {
            None
        };

        if records.is_empty() {
            return Err(Error::EndOfSequence);
        }

        Ok(Page::new(self, records, true, offset, next_item, false))
    }

    fn backward(&self, token: &PageToken) -> Result<Page<'_, C>> {
        let value = self.boundary_value(token)?;
        let offset = token.offset;
        let view = self.filtered(&value, !self.key.reverse_order())?.reverse();

        // Two extra records: the first one becomes the next marker of the page,
        // the last one proves that there is something before the page.
        let size = self.per_page.saturating_add(2);
        let mut records = view
            .slice(offset, offset.saturating_add(size))
            .map_err(Error::collection)?;

        if records.len() != size {
            return Err(Error::StartOfSequence);
        }

        records.pop();
        records.reverse();
        let next_item = records.pop();

        Ok(Page::new(self, records, false, offset, next_item, false))
    }

    fn check_key(&self, token: &PageToken) -> Result<()> {
        match token.key.as_deref() {
            None => Err(Error::invalid_token("Missing \"key\"")),
            Some(key) if key != self.key.key() => Err(Error::invalid_token(format!(
                "Invalid \"key\" \"{key}\" (paginator key is \"{}\")",
                self.key.key()
            ))),
            Some(_) => Ok(()),
        }
    }

    fn boundary_value(&self, token: &PageToken) -> Result<KeyValue> {
        let value = token
            .value
            .as_ref()
            .ok_or_else(|| Error::invalid_token("Missing \"value\""))?;
        self.key.field_type().decode_token_value(value)
    }

    /// Records on the far side of `value`: `key >= value`, or `key <= value`
    /// when `reverse` is set (nulls included when the key is nullable).
    fn filtered(&self, value: &KeyValue, reverse: bool) -> Result<C> {
        let filter = match (value.is_null(), reverse) {
            // Nulls are the lowest values: everything is >= NULL
            (true, false) => return Ok(self.collection.clone()),
            (true, true) => KeyFilter::IsNull,
            (false, false) => KeyFilter::AtLeast(value.clone()),
            (false, true) => KeyFilter::AtMost {
                value: value.clone(),
                or_null: self.key.is_nullable(),
            },
        };

        self.collection
            .filter(self.key.attr_path(), &filter)
            .map_err(Error::collection)
    }

    /// Number of records whose key equals `value`
    pub(crate) fn duplicates_count(&self, value: &KeyValue) -> Result<usize> {
        self.collection
            .filter(self.key.attr_path(), &KeyFilter::same_as(value))
            .and_then(|duplicates| duplicates.count())
            .map_err(Error::collection)
    }
}
