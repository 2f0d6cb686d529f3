//! Record type
//!
//! A record is an insertion-ordered mapping of column name → column value,
//! both arbitrary byte strings. Setting an existing column replaces its value
//! in place, preserving the original position.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TabulaError};

/// Column name reserved for "the primary key itself" in index declarations,
/// conditions and order specs. Never valid inside a stored record.
pub const PK_COLUMN: &[u8] = b"";

/// An insertion-ordered column → value mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    columns: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from column/value pairs (later duplicates win)
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        let mut record = Self::new();
        for (column, value) in pairs {
            record.set(column, value);
        }
        record
    }

    /// Set a column value, replacing any existing value in place
    pub fn set(&mut self, column: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some((_, v)) => *v = value,
            None => self.columns.push((column, value)),
        }
        self
    }

    /// Builder-style `set`
    pub fn with(mut self, column: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.set(column, value);
        self
    }

    /// Get a column value
    pub fn get(&self, column: &[u8]) -> Option<&[u8]> {
        self.columns
            .iter()
            .find(|(c, _)| c.as_slice() == column)
            .map(|(_, v)| v.as_slice())
    }

    /// Remove a column, returning its prior value
    pub fn remove(&mut self, column: &[u8]) -> Option<Vec<u8>> {
        let pos = self.columns.iter().position(|(c, _)| c.as_slice() == column)?;
        Some(self.columns.remove(pos).1)
    }

    /// Iterate columns in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.columns.iter().map(|(c, v)| (c.as_slice(), v.as_slice()))
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the record has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Prepend a column (used to surface the primary key as a pseudo-column)
    pub(crate) fn push_front(&mut self, column: Vec<u8>, value: Vec<u8>) {
        self.columns.insert(0, (column, value));
    }

    /// Validate the record for storage
    ///
    /// The empty column name is reserved as the primary-key sentinel and may
    /// not appear inside a stored record.
    pub fn validate(&self) -> Result<()> {
        for (column, _) in &self.columns {
            if column.is_empty() {
                return Err(TabulaError::InvalidRecord(
                    "empty column name is reserved for the primary key".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl<K: Into<Vec<u8>>, V: Into<Vec<u8>>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
