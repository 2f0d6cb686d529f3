//! Engine Module
//!
//! The table engine facade that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate the record store, index manager, and transaction state
//! - Route every mutation through log-then-apply with index maintenance
//! - Serialize writers, keep readers concurrent
//! - Execute queries against committed state

use std::path::Path;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, TabulaError};
use crate::index::{IndexAction, IndexKind, IndexManager};
use crate::log::Op;
use crate::query::{Query, ResultSet};
use crate::store::{AppliedOp, Record, RecordStore};
use crate::txn::TxnState;

/// The table engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Mutations** (put/delete/clear/set_index/transactions): serialized by
///   `write_lock`. Exactly one transaction may be active at a time; index
///   builds are transaction-exclusive.
/// - **Reads** (get/keys/count/search): no write lock; the committed table
///   uses an internal RwLock, and a query snapshots its candidate key set up
///   front, so an in-flight commit never changes results mid-query.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Persistent record store (log + committed table)
    store: RecordStore,

    /// Secondary indexes, kept consistent with every mutation
    indexes: IndexManager,

    /// Transaction state of this handle
    txn: Mutex<TxnState>,

    /// Serializes mutations and transaction state changes
    write_lock: Mutex<()>,
}

impl Engine {
    /// Open or create a table with the given config
    ///
    /// On startup:
    /// 1. Open/recover the backing log into the committed table
    /// 2. Replay recovered index declarations
    /// 3. Rebuild declared indexes from the committed records
    pub fn open(config: Config) -> Result<Self> {
        let (store, index_ops) = RecordStore::open(&config)?;

        let indexes = IndexManager::new();
        for op in index_ops {
            match op {
                Op::IndexAdd { column, kind } => {
                    indexes.set_index(&column, kind, IndexAction::Add, store.table());
                }
                Op::IndexRemove { column, kind } => {
                    indexes.set_index(&column, kind, IndexAction::Remove, store.table());
                }
                _ => unreachable!("record store only returns index registry ops"),
            }
        }

        Ok(Self {
            config,
            store,
            indexes,
            txn: Mutex::new(TxnState::default()),
            write_lock: Mutex::new(()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified backing file.
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().path(path).build();
        Self::open(config)
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Insert or fully replace the record at `pk`
    ///
    /// Inside a transaction the mutation is buffered until commit.
    pub fn put(&self, pk: &[u8], record: Record) -> Result<()> {
        record.validate()?;

        let _write_guard = self.write_lock.lock();

        let mut txn = self.txn.lock();
        if txn.is_active() {
            return txn.buffer(Op::Put {
                pk: pk.to_vec(),
                record,
            });
        }
        drop(txn);

        let old = self.store.apply_put(pk.to_vec(), record.clone())?;
        self.indexes.notify(pk, old.as_ref(), Some(&record));
        Ok(())
    }

    /// Get a record by primary key
    ///
    /// Reads committed state only; a miss is `None`, never an error.
    pub fn get(&self, pk: &[u8]) -> Option<Record> {
        self.store.get(pk)
    }

    /// Delete the record at `pk`, returning the prior record
    ///
    /// Inside a transaction the delete is buffered; the returned value is the
    /// currently committed record, ignoring ops buffered earlier in the same
    /// transaction. Deleting a key that only a buffered put introduced
    /// therefore returns `None`, though the commit still removes it.
    pub fn delete(&self, pk: &[u8]) -> Result<Option<Record>> {
        let _write_guard = self.write_lock.lock();

        let mut txn = self.txn.lock();
        if txn.is_active() {
            txn.buffer(Op::Delete { pk: pk.to_vec() })?;
            return Ok(self.store.get(pk));
        }
        drop(txn);

        let old = self.store.apply_delete(pk)?;
        if old.is_some() {
            self.indexes.notify(pk, old.as_ref(), None);
        }
        Ok(old)
    }

    /// Remove all records and all index entries
    ///
    /// Declared indexes survive, empty.
    pub fn clear(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        let mut txn = self.txn.lock();
        if txn.is_active() {
            return txn.buffer(Op::Clear);
        }
        drop(txn);

        self.store.apply_clear()?;
        self.indexes.clear_entries();
        Ok(())
    }

    /// Snapshot of primary keys in byte order, optionally prefix-filtered
    /// and truncated
    pub fn keys(&self, prefix: Option<&[u8]>, limit: Option<usize>) -> Vec<Vec<u8>> {
        self.store.keys(prefix, limit)
    }

    /// Current number of records — O(1)
    pub fn count(&self) -> usize {
        self.store.count()
    }

    /// Monotonically increasing id, unique within this open lifetime
    pub fn generate_unique_id(&self) -> u64 {
        self.store.generate_unique_id()
    }

    /// Write a full copy of committed state to `destination`
    ///
    /// `compact` reclaims space from deleted/overwritten records; the result
    /// is an independently openable table. The source is never modified.
    pub fn copy(&self, destination: &Path, compact: bool) -> Result<()> {
        // Exclude concurrent mutations for the duration of the snapshot.
        // Buffered transaction mutations are not committed state, so an
        // active transaction does not block a copy.
        let _write_guard = self.write_lock.lock();
        self.store.copy(destination, compact, &self.indexes.registry())
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    /// Build or tear down a secondary index on `column`
    ///
    /// The empty column name indexes the primary key itself. Building scans
    /// all current records once and is exclusive with transactions. Adding an
    /// existing index rebuilds it; removing an absent one is a no-op.
    pub fn set_index(&self, column: &[u8], kind: IndexKind, action: IndexAction) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        if self.txn.lock().is_active() {
            return Err(TabulaError::TransactionState(
                "index changes are not allowed while a transaction is active".to_string(),
            ));
        }

        match action {
            IndexAction::Add => {
                self.store.log_index_op(Op::IndexAdd {
                    column: column.to_vec(),
                    kind,
                })?;
                self.indexes
                    .set_index(column, kind, IndexAction::Add, self.store.table());
            }
            IndexAction::Remove => {
                if !self.indexes.has_index(column, kind) {
                    return Ok(());
                }
                self.store.log_index_op(Op::IndexRemove {
                    column: column.to_vec(),
                    kind,
                })?;
                self.indexes
                    .set_index(column, kind, IndexAction::Remove, self.store.table());
            }
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Execute a query, producing a lazy result set
    pub fn search(&self, query: &Query) -> Result<ResultSet<'_>> {
        crate::query::execute(&self.store, &self.indexes, query)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Begin a transaction; fails if one is already active
    pub fn begin(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        if self.store.is_read_only() {
            return Err(TabulaError::ReadOnly);
        }
        self.txn.lock().begin()
    }

    /// Commit the active transaction
    ///
    /// All buffered mutations become durable and visible together, or none
    /// do: the batch is synced to the log before any of it is applied.
    pub fn commit(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        let (id, ops) = self.txn.lock().take_for_commit()?;
        if ops.is_empty() {
            return Ok(());
        }

        debug!(txn = id, ops = ops.len(), "committing transaction");
        let applied = self.store.commit_batch(id, ops)?;
        for op in applied {
            match op {
                AppliedOp::Put { pk, old, new } => {
                    self.indexes.notify(&pk, old.as_ref(), Some(&new));
                }
                AppliedOp::Delete { pk, old } => {
                    if old.is_some() {
                        self.indexes.notify(&pk, old.as_ref(), None);
                    }
                }
                AppliedOp::Clear => self.indexes.clear_entries(),
            }
        }
        Ok(())
    }

    /// Abort the active transaction, discarding buffered mutations
    pub fn abort(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.txn.lock().abort()
    }

    /// Run a closure inside a transaction
    ///
    /// Commits when the closure returns `Ok`, aborts when it returns `Err`.
    /// The abort error, if any, is swallowed in favor of the closure's error.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.begin()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.abort();
                Err(e)
            }
        }
    }

    // =========================================================================
    // Lifecycle / Accessors
    // =========================================================================

    /// Close the engine gracefully, syncing the log to disk
    pub fn close(self) -> Result<()> {
        self.store.sync()
    }

    /// Get the backing file path
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
