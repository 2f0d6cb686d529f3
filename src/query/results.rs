//! Result Set
//!
//! A lazy, iterable view over the primary keys a query produced. The key
//! sequence is captured at query time; records are fetched from the store on
//! each `next()`. A record deleted between query and iteration surfaces as a
//! row with `record: None`, not as an error.

use crate::store::{RecordStore, Record, PK_COLUMN};

/// One row of a result set
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Primary key
    pub pk: Vec<u8>,

    /// The record, fetched at iteration time
    ///
    /// `None` when the query ran keys-only, or when the record vanished
    /// between query execution and this fetch.
    pub record: Option<Record>,
}

/// Lazy iterator over a query's final ordered primary-key sequence
pub struct ResultSet<'a> {
    keys: std::vec::IntoIter<Vec<u8>>,
    total: usize,
    store: &'a RecordStore,
    keys_only: bool,
    include_pk: bool,
}

impl<'a> ResultSet<'a> {
    pub(crate) fn new(
        keys: Vec<Vec<u8>>,
        store: &'a RecordStore,
        keys_only: bool,
        include_pk: bool,
    ) -> Self {
        Self {
            total: keys.len(),
            keys: keys.into_iter(),
            store,
            keys_only,
            include_pk,
        }
    }

    /// Number of matching primary keys
    pub fn len(&self) -> usize {
        self.total
    }

    /// Whether the query matched nothing
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Consume the result set, yielding the remaining primary keys
    pub fn into_keys(self) -> Vec<Vec<u8>> {
        self.keys.collect()
    }
}

impl Iterator for ResultSet<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        let pk = self.keys.next()?;

        if self.keys_only {
            return Some(Row { pk, record: None });
        }

        let mut record = self.store.get(&pk);
        if self.include_pk {
            if let Some(record) = record.as_mut() {
                record.push_front(PK_COLUMN.to_vec(), pk.clone());
            }
        }

        Some(Row { pk, record })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}
