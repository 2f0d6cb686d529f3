//! Record Store Module
//!
//! Persistent mapping from primary key to record.
//!
//! ## Responsibilities
//! - Open/recover the backing log and materialize the committed table
//! - Log every mutation before applying it in memory
//! - Commit transaction batches atomically (begin/ops/commit in one sync)
//! - Snapshot copies, plain or compacted
//!
//! ## Layout
//! The backing file is a single append-only log; opening replays it (see
//! `crate::log`). The committed table lives in memory behind a RwLock, so
//! point reads and queries run concurrently.

mod record;
mod table;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, TabulaError};
use crate::index::IndexKind;
use crate::log::{LogRecovery, LogWriter, Op};

pub use record::{Record, PK_COLUMN};
pub use table::Table;

/// A mutation applied by a committed batch, with the prior value captured
/// for index maintenance
#[derive(Debug)]
pub(crate) enum AppliedOp {
    Put {
        pk: Vec<u8>,
        old: Option<Record>,
        new: Record,
    },
    Delete {
        pk: Vec<u8>,
        old: Option<Record>,
    },
    Clear,
}

/// Persistent record store: append-only log + in-memory committed table
pub struct RecordStore {
    /// Path of the backing log file
    path: PathBuf,

    /// Committed records (internal RwLock, concurrent readers)
    table: Table,

    /// Log writer; absent when opened read-only
    writer: Option<Mutex<LogWriter>>,

    /// Monotonic unique-id source, scoped to this open lifetime
    next_uid: AtomicU64,
}

impl RecordStore {
    /// Open or create a record store per the config
    ///
    /// Returns the store plus the index registry operations recovered from
    /// the log, in order, for the caller to replay into its index manager.
    pub fn open(config: &Config) -> Result<(Self, Vec<Op>)> {
        let path = config.path.clone();
        let exists = path.exists();

        if !exists && !config.create {
            return Err(TabulaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no table file at {}", path.display()),
            )));
        }
        if (!exists || config.truncate) && !config.writable {
            return Err(TabulaError::Config(
                "cannot create or truncate a read-only table".to_string(),
            ));
        }

        // Fresh file: nothing to recover.
        if !exists || config.truncate {
            let writer = LogWriter::create(&path, config.sync_strategy)?;
            info!(path = %path.display(), "created table file");
            return Ok((
                Self {
                    path,
                    table: Table::new(),
                    writer: Some(Mutex::new(writer)),
                    next_uid: AtomicU64::new(1),
                },
                Vec::new(),
            ));
        }

        // Existing file: replay the log into the committed table.
        let (ops, recovery) = LogRecovery::recover(&path)?;
        if recovery.tail_corrupted || recovery.entries_discarded > 0 {
            warn!(
                discarded = recovery.entries_discarded,
                tail_corrupted = recovery.tail_corrupted,
                "log recovery dropped entries"
            );
        }

        let table = Table::new();
        let mut index_ops = Vec::new();
        for op in ops {
            match op {
                Op::Put { pk, record } => {
                    table.insert(pk, record);
                }
                Op::Delete { pk } => {
                    table.remove(&pk);
                }
                Op::Clear => table.clear(),
                op @ (Op::IndexAdd { .. } | Op::IndexRemove { .. }) => index_ops.push(op),
                // Recovery already resolved transaction markers.
                Op::TxnBegin { .. } | Op::TxnCommit { .. } | Op::TxnAbort { .. } => {}
            }
        }

        info!(
            path = %path.display(),
            records = table.len(),
            entries = recovery.entries_read,
            last_lsn = recovery.last_lsn,
            "opened table file"
        );

        let writer = if config.writable {
            Some(Mutex::new(LogWriter::open_at(
                &path,
                recovery.valid_len,
                recovery.last_lsn + 1,
                config.sync_strategy,
            )?))
        } else {
            None
        };

        Ok((
            Self {
                path,
                table,
                writer,
                next_uid: AtomicU64::new(1),
            },
            index_ops,
        ))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a record by primary key; a miss is `None`, never an error
    pub fn get(&self, pk: &[u8]) -> Option<Record> {
        self.table.get(pk)
    }

    /// Current number of records — O(1)
    pub fn count(&self) -> usize {
        self.table.len()
    }

    /// Snapshot of primary keys in byte order
    pub fn keys(&self, prefix: Option<&[u8]>, limit: Option<usize>) -> Vec<Vec<u8>> {
        self.table.keys(prefix, limit)
    }

    /// Monotonically increasing id, unique within this open lifetime
    pub fn generate_unique_id(&self) -> u64 {
        self.next_uid.fetch_add(1, Ordering::SeqCst)
    }

    /// The committed table (for index builds and scans)
    pub(crate) fn table(&self) -> &Table {
        &self.table
    }

    // =========================================================================
    // Mutations (callers hold the engine write lock)
    // =========================================================================

    /// Log and apply a put, returning the prior record
    pub(crate) fn apply_put(&self, pk: Vec<u8>, record: Record) -> Result<Option<Record>> {
        self.append(Op::Put {
            pk: pk.clone(),
            record: record.clone(),
        })?;
        Ok(self.table.insert(pk, record))
    }

    /// Log and apply a delete, returning the prior record
    ///
    /// A miss is not logged: there is nothing to replay.
    pub(crate) fn apply_delete(&self, pk: &[u8]) -> Result<Option<Record>> {
        if !self.table.contains(pk) {
            // Still reject the call when read-only, same as a hit would.
            if self.writer.is_none() {
                return Err(TabulaError::ReadOnly);
            }
            return Ok(None);
        }
        self.append(Op::Delete { pk: pk.to_vec() })?;
        Ok(self.table.remove(pk))
    }

    /// Log and apply a clear
    pub(crate) fn apply_clear(&self) -> Result<()> {
        self.append(Op::Clear)?;
        self.table.clear();
        Ok(())
    }

    /// Persist an index registry change
    pub(crate) fn log_index_op(&self, op: Op) -> Result<()> {
        self.append(op)
    }

    /// Durably commit a transaction batch, then apply it
    ///
    /// The whole batch — begin marker, operations, commit marker — is synced
    /// to the log before any of it becomes visible, and the table applies it
    /// in one critical section so readers see all of it or none of it.
    /// Returns the applied operations with prior values for index
    /// maintenance.
    pub(crate) fn commit_batch(&self, txn_id: u64, ops: Vec<Op>) -> Result<Vec<AppliedOp>> {
        let writer = self.writer.as_ref().ok_or(TabulaError::ReadOnly)?;

        // Reject an invalid batch before any of it reaches the log.
        for op in &ops {
            if !matches!(op, Op::Put { .. } | Op::Delete { .. } | Op::Clear) {
                return Err(TabulaError::Storage(format!(
                    "operation not valid inside a transaction batch: {:?}",
                    op
                )));
            }
        }

        let mut batch = Vec::with_capacity(ops.len() + 2);
        batch.push(Op::TxnBegin { id: txn_id });
        batch.extend(ops.iter().cloned());
        batch.push(Op::TxnCommit { id: txn_id });
        writer.lock().append_batch(batch)?;

        Ok(self.table.apply_batch(ops))
    }

    // =========================================================================
    // Copy / Lifecycle
    // =========================================================================

    /// Write a full copy of current committed state to `destination`
    ///
    /// Compact form rewrites only the index registry and live records, so its
    /// size is ≤ a plain copy of the same logical state. Either result opens
    /// independently. The source is read-only for the whole operation;
    /// callers hold the engine write lock to keep the snapshot consistent.
    pub(crate) fn copy(
        &self,
        destination: &Path,
        compact: bool,
        registry: &[(Vec<u8>, IndexKind)],
    ) -> Result<()> {
        if compact {
            // Sync a large batch at the end rather than per entry.
            let mut writer = LogWriter::create(
                destination,
                crate::config::SyncStrategy::EveryNEntries { count: usize::MAX },
            )?;
            let mut batch: Vec<Op> = registry
                .iter()
                .map(|(column, kind)| Op::IndexAdd {
                    column: column.clone(),
                    kind: *kind,
                })
                .collect();
            self.table.for_each(|pk, record| {
                batch.push(Op::Put {
                    pk: pk.to_vec(),
                    record: record.clone(),
                });
            });
            writer.append_batch(batch)?;
            info!(destination = %destination.display(), "compact copy written");
        } else {
            // Flush so the on-disk file reflects the committed state exactly.
            if let Some(writer) = self.writer.as_ref() {
                writer.lock().sync()?;
            }
            fs::copy(&self.path, destination)?;
            info!(destination = %destination.display(), "copy written");
        }
        Ok(())
    }

    /// Flush and fsync the log
    pub(crate) fn sync(&self) -> Result<()> {
        if let Some(writer) = self.writer.as_ref() {
            writer.lock().sync()?;
        }
        Ok(())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store was opened read-only
    pub fn is_read_only(&self) -> bool {
        self.writer.is_none()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn append(&self, op: Op) -> Result<()> {
        let writer = self.writer.as_ref().ok_or(TabulaError::ReadOnly)?;
        writer.lock().append(op)?;
        Ok(())
    }
}
