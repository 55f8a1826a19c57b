//! Pages produced by the keyset paginator

use super::paginator::KeysetPaginator;
use super::types::PageToken;
use crate::collection::{Collection, Record};
use crate::error::{Error, Result};
use crate::types::KeyValue;
use std::cell::RefCell;
use std::fmt;
use tracing::{trace, warn};

/// A page of records and the boundaries needed to reach its neighbours
///
/// The duplicate counts a page queries are cached inside it, so a `Page` is
/// not meant to be shared between threads.
pub struct Page<'a, C: Collection> {
    paginator: &'a KeysetPaginator<C>,
    records: Vec<C::Record>,
    forward: bool,
    offset: usize,
    next_item: Option<C::Record>,
    first_page: bool,
    duplicates: RefCell<Vec<(KeyValue, usize)>>,
}

impl<'a, C: Collection> Page<'a, C> {
    pub(crate) fn new(
        paginator: &'a KeysetPaginator<C>,
        records: Vec<C::Record>,
        forward: bool,
        offset: usize,
        next_item: Option<C::Record>,
        first_page: bool,
    ) -> Self {
        Self {
            paginator,
            records,
            forward,
            offset,
            next_item,
            first_page,
            duplicates: RefCell::new(Vec::new()),
        }
    }

    /// Records of the page, in collection order
    pub fn records(&self) -> &[C::Record] {
        &self.records
    }

    /// Consume the page, keeping its records
    pub fn into_records(self) -> Vec<C::Record> {
        self.records
    }

    /// Iterate over the records
    pub fn iter(&self) -> std::slice::Iter<'_, C::Record> {
        self.records.iter()
    }

    /// Get a record by position
    pub fn get(&self, index: usize) -> Option<&C::Record> {
        self.records.get(index)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the page holds no record (only possible for an empty collection)
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record of the following page, if any
    pub fn next_item(&self) -> Option<&C::Record> {
        self.next_item.as_ref()
    }

    /// Tiebreak offset the page was fetched with
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether another page follows
    pub fn has_next(&self) -> bool {
        self.next_item.is_some()
    }

    /// Whether another page precedes; false only for the first page
    pub fn has_previous(&self) -> bool {
        !self.first_page
    }

    /// Whether the collection spans more than this page
    pub fn has_other_pages(&self) -> bool {
        self.has_previous() || self.has_next()
    }

    /// Token that fetches this page again
    pub fn info(&self) -> PageToken {
        let key = self.paginator.key();

        if !self.has_previous() {
            return PageToken::first();
        }

        let boundary = if self.forward {
            self.records.first()
        } else {
            self.next_item.as_ref()
        };

        match boundary {
            Some(record) if self.has_next() => {
                let value = self.value_of(record).to_token_value();
                if self.forward {
                    PageToken::forward(key, value, self.offset)
                } else {
                    PageToken::backward(key, value, self.offset)
                }
            }
            _ => PageToken::last(key),
        }
    }

    /// Token of the following page, or `None` on the last page
    pub fn next_token(&self) -> Result<Option<PageToken>> {
        let Some(next_item) = &self.next_item else {
            return Ok(None);
        };

        let value = self.value_of(next_item);
        let mut offset = self.run_length(&value, self.records.iter().rev());

        if offset == self.paginator.per_page() {
            // The run fills the page and may continue on the pages before it
            offset = if self.forward {
                offset.saturating_add(self.offset)
            } else {
                self.remaining_duplicates(&value, self.offset)?
            };
        }

        Ok(Some(PageToken::forward(
            self.paginator.key(),
            value.to_token_value(),
            offset,
        )))
    }

    /// Token of the preceding page, or `None` on the first page
    pub fn previous_token(&self) -> Result<Option<PageToken>> {
        if !self.has_previous() {
            return Ok(None);
        }

        let mut records = self.records.iter();
        let Some(first) = records.next() else {
            return Ok(None);
        };

        let value = self.value_of(first);
        let mut offset = self.run_length(&value, records);

        // per_page > 1, so this run can be empty but never negative
        if offset == self.paginator.per_page() - 1 {
            // The run fills the page and may continue on the pages after it
            if self.forward {
                offset = self.remaining_duplicates(&value, self.offset)?;
            } else if self
                .next_item
                .as_ref()
                .is_some_and(|next_item| self.value_of(next_item) == value)
            {
                offset = offset.saturating_add(self.offset).saturating_add(1);
            }
        }

        Ok(Some(PageToken::backward(
            self.paginator.key(),
            value.to_token_value(),
            offset,
        )))
    }

    fn value_of(&self, record: &C::Record) -> KeyValue {
        record.value_at(self.paginator.sort_key().attr_path())
    }

    /// Number of leading records of `records` whose key is `value`
    fn run_length<'r, I>(&self, value: &KeyValue, records: I) -> usize
    where
        I: Iterator<Item = &'r C::Record>,
        C::Record: 'r,
    {
        records
            .take_while(|record| self.value_of(record) == *value)
            .count()
    }

    /// Duplicates of `value` on the other side of the boundary.
    ///
    /// The whole run is `forward offset + backward offset + 1` records long.
    fn remaining_duplicates(&self, value: &KeyValue, consumed: usize) -> Result<usize> {
        let total = self.duplicates_count(value)?;

        Ok(total.checked_sub(consumed.saturating_add(1)).unwrap_or_else(|| {
            warn!(
                key = self.paginator.key(),
                value = %value,
                total,
                consumed,
                "Duplicate run is shorter than the offsets pointing into it; the collection changed"
            );
            0
        }))
    }

    fn duplicates_count(&self, value: &KeyValue) -> Result<usize> {
        let cached = self
            .duplicates
            .borrow()
            .iter()
            .find(|(cached, _)| cached == value)
            .map(|(_, count)| *count);

        if let Some(count) = cached {
            trace!(value = %value, count, "Duplicate count (cached)");
            return Ok(count);
        }

        let count = self.paginator.duplicates_count(value)?;
        trace!(value = %value, count, "Duplicate count");
        self.duplicates.borrow_mut().push((value.clone(), count));
        Ok(count)
    }

    /// Number of duplicate counts cached by this page
    #[cfg(test)]
    pub(crate) fn cached_duplicates(&self) -> usize {
        self.duplicates.borrow().len()
    }
}

impl<C: Collection> fmt::Debug for Page<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("key", &self.paginator.key())
            .field("forward", &self.forward)
            .field("offset", &self.offset)
            .field("len", &self.records.len())
            .field("has_previous", &self.has_previous())
            .field("has_next", &self.has_next())
            .finish()
    }
}

impl<'p, C: Collection> IntoIterator for &'p Page<'_, C> {
    type Item = &'p C::Record;
    type IntoIter = std::slice::Iter<'p, C::Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ============================================================================
// Page Iterator
// ============================================================================

enum Cursor {
    Start,
    Token(PageToken),
    Failed(Error),
    Done,
}

/// Iterator over all pages, following next tokens
///
/// Stops after the last page, or when a forward token runs past the end.
pub struct Pages<'a, C: Collection> {
    paginator: &'a KeysetPaginator<C>,
    cursor: Cursor,
}

impl<'a, C: Collection> Pages<'a, C> {
    pub(crate) fn new(paginator: &'a KeysetPaginator<C>) -> Self {
        Self {
            paginator,
            cursor: Cursor::Start,
        }
    }
}

impl<'a, C: Collection> Iterator for Pages<'a, C> {
    type Item = Result<Page<'a, C>>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return None,
            Cursor::Failed(err) => return Some(Err(err)),
            Cursor::Start => self.paginator.page(None),
            Cursor::Token(token) => self.paginator.page(Some(&token)),
        };

        match result {
            Ok(page) => {
                self.cursor = match page.next_token() {
                    Ok(Some(token)) => Cursor::Token(token),
                    Ok(None) => Cursor::Done,
                    Err(err) => Cursor::Failed(err),
                };
                Some(Ok(page))
            }
            Err(Error::EndOfSequence) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
