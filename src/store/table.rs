//! Committed table
//!
//! BTreeMap-based view of all committed records, behind a RwLock so queries
//! and point reads proceed concurrently with each other.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::log::Op;

use super::{AppliedOp, Record};

/// In-memory view of committed records, keyed by primary key
#[derive(Default)]
pub struct Table {
    data: RwLock<BTreeMap<Vec<u8>, Record>>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a record by primary key (read lock)
    pub fn get(&self, pk: &[u8]) -> Option<Record> {
        self.data.read().get(pk).cloned()
    }

    /// Insert or replace a record, returning the prior value (write lock)
    pub fn insert(&self, pk: Vec<u8>, record: Record) -> Option<Record> {
        self.data.write().insert(pk, record)
    }

    /// Remove a record, returning the prior value (write lock)
    pub fn remove(&self, pk: &[u8]) -> Option<Record> {
        self.data.write().remove(pk)
    }

    /// Remove all records
    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// Number of records — O(1)
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Whether a primary key is present
    pub fn contains(&self, pk: &[u8]) -> bool {
        self.data.read().contains_key(pk)
    }

    /// Apply a committed batch under one write lock
    ///
    /// Every mutation in the batch becomes visible at once: a concurrent
    /// reader observes the table either before or after the whole batch,
    /// never between its operations. Returns the applied operations with
    /// prior values for index maintenance.
    ///
    /// The caller has already rejected non-record operations.
    pub(crate) fn apply_batch(&self, ops: Vec<Op>) -> Vec<AppliedOp> {
        let mut data = self.data.write();
        let mut applied = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                Op::Put { pk, record } => {
                    let old = data.insert(pk.clone(), record.clone());
                    applied.push(AppliedOp::Put {
                        pk,
                        old,
                        new: record,
                    });
                }
                Op::Delete { pk } => {
                    let old = data.remove(&pk);
                    applied.push(AppliedOp::Delete { pk, old });
                }
                Op::Clear => {
                    data.clear();
                    applied.push(AppliedOp::Clear);
                }
                Op::IndexAdd { .. }
                | Op::IndexRemove { .. }
                | Op::TxnBegin { .. }
                | Op::TxnCommit { .. }
                | Op::TxnAbort { .. } => {}
            }
        }
        applied
    }

    /// Snapshot of primary keys in byte order, optionally prefix-filtered
    /// and truncated
    pub fn keys(&self, prefix: Option<&[u8]>, limit: Option<usize>) -> Vec<Vec<u8>> {
        let data = self.data.read();
        let limit = limit.unwrap_or(usize::MAX);

        match prefix {
            None => data.keys().take(limit).cloned().collect(),
            Some(prefix) => data
                .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(|(k, _)| k.starts_with(prefix))
                .take(limit)
                .map(|(k, _)| k.clone())
                .collect(),
        }
    }

    /// Visit every record under the read lock, in key order
    ///
    /// The table is locked for the whole visit; callers must not mutate the
    /// store from within the closure.
    pub fn for_each<F: FnMut(&[u8], &Record)>(&self, mut f: F) {
        for (pk, record) in self.data.read().iter() {
            f(pk, record);
        }
    }
}
