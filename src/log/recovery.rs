//! Log recovery
//!
//! Replays a log file into the sequence of effective operations, resolving
//! transaction boundaries and handling a torn or corrupt tail.
//!
//! ## Transaction resolution
//! - Operations outside any `TxnBegin`/`TxnCommit` pair apply directly.
//! - Operations between `TxnBegin` and its `TxnCommit` apply together once
//!   the commit marker is seen.
//! - A `TxnBegin` with no matching `TxnCommit` (crash mid-commit) is
//!   discarded entirely, as is anything ended by `TxnAbort`.

use std::path::Path;

use tracing::warn;

use crate::error::{Result, TabulaError};

use super::entry::Op;
use super::reader::LogReader;

/// Statistics from a recovery pass
#[derive(Debug, Clone, Default)]
pub struct RecoveryResult {
    /// Entries successfully read
    pub entries_read: u64,

    /// Entries discarded as part of an unfinished or aborted transaction
    pub entries_discarded: u64,

    /// Whether a torn/corrupt tail was detected (and will be truncated)
    pub tail_corrupted: bool,

    /// Highest LSN seen; the writer continues from `last_lsn + 1`
    pub last_lsn: u64,

    /// Byte offset just past the last valid entry
    pub valid_len: u64,
}

/// Log recovery
pub struct LogRecovery;

impl LogRecovery {
    /// Replay a log file, returning the effective operations in order
    pub fn recover(path: &Path) -> Result<(Vec<Op>, RecoveryResult)> {
        let mut reader = LogReader::open(path)?;

        let mut ops: Vec<Op> = Vec::new();
        let mut pending: Option<(u64, Vec<Op>)> = None;
        let mut result = RecoveryResult {
            valid_len: reader.offset(),
            ..Default::default()
        };

        loop {
            let entry = match reader.next_entry() {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(TabulaError::Corruption(reason)) => {
                    // Torn tail: keep everything before it, drop the rest.
                    warn!(%reason, offset = reader.offset(), "truncating corrupt log tail");
                    result.tail_corrupted = true;
                    break;
                }
                Err(e) => return Err(e),
            };

            result.entries_read += 1;
            result.last_lsn = entry.lsn;
            result.valid_len = reader.offset();

            match entry.op {
                Op::TxnBegin { id } => {
                    if let Some((_, buffered)) = pending.take() {
                        // Previous transaction never committed.
                        result.entries_discarded += buffered.len() as u64 + 1;
                    }
                    pending = Some((id, Vec::new()));
                }
                Op::TxnCommit { id } => match pending.take() {
                    Some((begin_id, buffered)) if begin_id == id => {
                        ops.extend(buffered);
                    }
                    Some((_, buffered)) => {
                        result.entries_discarded += buffered.len() as u64 + 2;
                    }
                    // Stray commit marker with no begin: nothing to apply.
                    None => result.entries_discarded += 1,
                },
                Op::TxnAbort { .. } => {
                    if let Some((_, buffered)) = pending.take() {
                        result.entries_discarded += buffered.len() as u64 + 2;
                    }
                }
                op => match pending.as_mut() {
                    Some((_, buffered)) => buffered.push(op),
                    None => ops.push(op),
                },
            }
        }

        if let Some((id, buffered)) = pending.take() {
            warn!(txn = id, "discarding uncommitted transaction found in log");
            result.entries_discarded += buffered.len() as u64 + 1;
        }

        Ok((ops, result))
    }
}
