//! Index Manager Module
//!
//! Maintains secondary indexes over named columns and keeps them consistent
//! with every record mutation.
//!
//! ## Responsibilities
//! - Build or tear down per-column indexes (lexical and decimal)
//! - Observe record mutations and patch affected index entries
//! - Answer candidate-key lookups for index-compatible conditions
//!
//! A column may carry both a lexical and a decimal index at once. The empty
//! column name indexes the primary key itself.

mod decimal;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::query::{Condition, Operator};
use crate::store::{Record, Table};

pub use decimal::{parse_decimal, DecimalKey};

/// Ordering semantics of a secondary index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// Orders entries by raw byte comparison
    Lexical,

    /// Orders entries by parsed numeric value; unparsable values are absent
    Decimal,
}

/// What `set_index` should do
///
/// An explicit two-field request: no overloaded sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAction {
    /// Build the index (rebuilding if it already exists)
    Add,

    /// Drop the index; a no-op if it does not exist
    Remove,
}

/// Ordered map from column value to the set of primary keys holding it
type LexicalIndex = BTreeMap<Vec<u8>, BTreeSet<Vec<u8>>>;
type DecimalIndex = BTreeMap<DecimalKey, BTreeSet<Vec<u8>>>;

/// Indexes active on a single column
#[derive(Default)]
struct ColumnIndexes {
    lexical: Option<LexicalIndex>,
    decimal: Option<DecimalIndex>,
}

impl ColumnIndexes {
    fn is_empty(&self) -> bool {
        self.lexical.is_none() && self.decimal.is_none()
    }

    fn insert(&mut self, value: &[u8], pk: &[u8]) {
        if let Some(lexical) = self.lexical.as_mut() {
            lexical
                .entry(value.to_vec())
                .or_default()
                .insert(pk.to_vec());
        }
        if let Some(decimal) = self.decimal.as_mut() {
            if let Some(number) = parse_decimal(value) {
                decimal
                    .entry(DecimalKey::new(number))
                    .or_default()
                    .insert(pk.to_vec());
            }
        }
    }

    fn remove(&mut self, value: &[u8], pk: &[u8]) {
        if let Some(lexical) = self.lexical.as_mut() {
            if let Some(set) = lexical.get_mut(value) {
                set.remove(pk);
                if set.is_empty() {
                    lexical.remove(value);
                }
            }
        }
        if let Some(decimal) = self.decimal.as_mut() {
            if let Some(number) = parse_decimal(value) {
                let key = DecimalKey::new(number);
                if let Some(set) = decimal.get_mut(&key) {
                    set.remove(pk);
                    if set.is_empty() {
                        decimal.remove(&key);
                    }
                }
            }
        }
    }
}

/// Maintains all secondary indexes of one table
#[derive(Default)]
pub struct IndexManager {
    columns: RwLock<BTreeMap<Vec<u8>, ColumnIndexes>>,
}

impl IndexManager {
    /// Create an empty index manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Build or tear down an index on `column`
    ///
    /// Building scans every current record once; the new structure is built
    /// aside and swapped in whole, so a build never leaves a half-filled
    /// index behind. Returns whether the registry changed.
    pub fn set_index(
        &self,
        column: &[u8],
        kind: IndexKind,
        action: IndexAction,
        table: &Table,
    ) -> bool {
        match action {
            IndexAction::Add => {
                let existed = self.has_index(column, kind);
                match kind {
                    IndexKind::Lexical => {
                        let mut built: LexicalIndex = BTreeMap::new();
                        table.for_each(|pk, record| {
                            if let Some(value) = column_value(column, pk, Some(record)) {
                                built.entry(value.to_vec()).or_default().insert(pk.to_vec());
                            }
                        });
                        self.columns.write().entry(column.to_vec()).or_default().lexical =
                            Some(built);
                    }
                    IndexKind::Decimal => {
                        let mut built: DecimalIndex = BTreeMap::new();
                        table.for_each(|pk, record| {
                            let value = match column_value(column, pk, Some(record)) {
                                Some(value) => value,
                                None => return,
                            };
                            if let Some(number) = parse_decimal(value) {
                                built
                                    .entry(DecimalKey::new(number))
                                    .or_default()
                                    .insert(pk.to_vec());
                            }
                        });
                        self.columns.write().entry(column.to_vec()).or_default().decimal =
                            Some(built);
                    }
                }
                debug!(column = ?String::from_utf8_lossy(column), ?kind, rebuilt = existed, "index built");
                !existed
            }
            IndexAction::Remove => {
                let mut columns = self.columns.write();
                let Some(indexes) = columns.get_mut(column) else {
                    return false;
                };
                let removed = match kind {
                    IndexKind::Lexical => indexes.lexical.take().is_some(),
                    IndexKind::Decimal => indexes.decimal.take().is_some(),
                };
                if indexes.is_empty() {
                    columns.remove(column);
                }
                removed
            }
        }
    }

    /// Whether an index of `kind` is active on `column`
    pub fn has_index(&self, column: &[u8], kind: IndexKind) -> bool {
        self.columns
            .read()
            .get(column)
            .map(|indexes| match kind {
                IndexKind::Lexical => indexes.lexical.is_some(),
                IndexKind::Decimal => indexes.decimal.is_some(),
            })
            .unwrap_or(false)
    }

    /// Active indexes as (column, kind) pairs, in column order
    pub fn registry(&self) -> Vec<(Vec<u8>, IndexKind)> {
        let columns = self.columns.read();
        let mut registry = Vec::new();
        for (column, indexes) in columns.iter() {
            if indexes.lexical.is_some() {
                registry.push((column.clone(), IndexKind::Lexical));
            }
            if indexes.decimal.is_some() {
                registry.push((column.clone(), IndexKind::Decimal));
            }
        }
        registry
    }

    /// Observe a record mutation and patch affected index entries
    ///
    /// `old`/`new` are the record before/after the mutation (`None` for
    /// insert/delete respectively). Columns whose value did not change are
    /// untouched.
    pub fn notify(&self, pk: &[u8], old: Option<&Record>, new: Option<&Record>) {
        let mut columns = self.columns.write();
        for (column, indexes) in columns.iter_mut() {
            let old_value = column_value(column, pk, old);
            let new_value = column_value(column, pk, new);
            if old_value == new_value {
                continue;
            }
            if let Some(value) = old_value {
                indexes.remove(value, pk);
            }
            if let Some(value) = new_value {
                indexes.insert(value, pk);
            }
        }
    }

    /// Drop all index entries, keeping the registry of declared indexes
    pub fn clear_entries(&self) {
        let mut columns = self.columns.write();
        for indexes in columns.values_mut() {
            if let Some(lexical) = indexes.lexical.as_mut() {
                lexical.clear();
            }
            if let Some(decimal) = indexes.decimal.as_mut() {
                decimal.clear();
            }
        }
    }

    /// Candidate primary keys for a condition, straight from an index
    ///
    /// Returns `None` when no compatible index applies and the caller must
    /// fall back to a scan. `Some(vec![])` is a definitive empty answer.
    /// Negated conditions never use an index: their complement is not a
    /// contiguous index scan.
    pub fn candidates(&self, condition: &Condition) -> Option<Vec<Vec<u8>>> {
        if !condition.allow_index() || condition.is_negated() {
            return None;
        }

        let columns = self.columns.read();
        let indexes = columns.get(condition.column())?;

        match condition.op() {
            Operator::Eq => {
                let lexical = indexes.lexical.as_ref()?;
                Some(
                    lexical
                        .get(condition.operand())
                        .map(|set| set.iter().cloned().collect())
                        .unwrap_or_default(),
                )
            }
            Operator::BeginsWith => {
                let lexical = indexes.lexical.as_ref()?;
                let prefix = condition.operand();
                let mut keys = BTreeSet::new();
                for (_, set) in lexical
                    .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
                    .take_while(|(value, _)| value.starts_with(prefix))
                {
                    keys.extend(set.iter().cloned());
                }
                Some(keys.into_iter().collect())
            }
            Operator::NumEq => {
                let decimal = indexes.decimal.as_ref()?;
                let number = condition.operand_number()?;
                Some(
                    decimal
                        .get(&DecimalKey::new(number))
                        .map(|set| set.iter().cloned().collect())
                        .unwrap_or_default(),
                )
            }
            Operator::NumGt | Operator::NumGe | Operator::NumLt | Operator::NumLe => {
                let decimal = indexes.decimal.as_ref()?;
                let number = condition.operand_number()?;
                let key = DecimalKey::new(number);
                let range = match condition.op() {
                    Operator::NumGt => (Bound::Excluded(key), Bound::Unbounded),
                    Operator::NumGe => (Bound::Included(key), Bound::Unbounded),
                    Operator::NumLt => (Bound::Unbounded, Bound::Excluded(key)),
                    _ => (Bound::Unbounded, Bound::Included(key)),
                };
                Some(collect_range(decimal, range))
            }
            Operator::NumBetween => {
                let decimal = indexes.decimal.as_ref()?;
                let (lo, hi) = condition.operand_range()?;
                Some(collect_range(
                    decimal,
                    (
                        Bound::Included(DecimalKey::new(lo)),
                        Bound::Included(DecimalKey::new(hi)),
                    ),
                ))
            }
            // Remaining operators need full-value inspection.
            _ => None,
        }
    }
}

/// Collect primary keys from a decimal range scan, in byte order
fn collect_range(
    decimal: &DecimalIndex,
    range: (Bound<DecimalKey>, Bound<DecimalKey>),
) -> Vec<Vec<u8>> {
    let mut keys = BTreeSet::new();
    for (_, set) in decimal.range(range) {
        keys.extend(set.iter().cloned());
    }
    keys.into_iter().collect()
}

/// Resolve the indexed value of `column` for a record
///
/// The empty column name denotes the primary key itself.
fn column_value<'a>(column: &[u8], pk: &'a [u8], record: Option<&'a Record>) -> Option<&'a [u8]> {
    let record = record?;
    if column.is_empty() {
        Some(pk)
    } else {
        record.get(column)
    }
}
