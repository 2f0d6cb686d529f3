//! Log writer
//!
//! Handles appending entries to the log file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::Result;

use super::entry::{LogEntry, Op, FILE_HEADER_SIZE, MAGIC, VERSION};

/// Appends entries to the log file
pub struct LogWriter {
    /// Buffered writer positioned at the end of the valid log
    writer: BufWriter<File>,
    /// Path of the log file
    path: PathBuf,
    /// LSN to assign to the next appended entry
    next_lsn: u64,
    /// Current logical file length (header + valid entries)
    len: u64,
    /// How often to fsync
    sync_strategy: SyncStrategy,
    /// Entries appended since the last fsync
    unsynced: usize,
}

impl LogWriter {
    /// Create a fresh log file (truncating any existing contents)
    ///
    /// Writes the file header and syncs it before returning.
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            next_lsn: 1,
            len: FILE_HEADER_SIZE,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Open an existing log for appending after recovery
    ///
    /// `valid_len` is the byte offset just past the last valid entry; anything
    /// beyond it (a torn tail) is truncated away. `next_lsn` continues the
    /// recovered sequence.
    pub fn open_at(
        path: &Path,
        valid_len: u64,
        next_lsn: u64,
        sync_strategy: SyncStrategy,
    ) -> Result<Self> {
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(valid_len)?;

        let mut writer = BufWriter::new(file);
        writer.seek(SeekFrom::Start(valid_len))?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            next_lsn,
            len: valid_len,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append a single operation, returning its LSN
    pub fn append(&mut self, op: Op) -> Result<u64> {
        let lsn = self.write_entry(op)?;
        self.maybe_sync()?;
        Ok(lsn)
    }

    /// Append a batch of operations and force a sync
    ///
    /// Used for transaction commits: the batch (including its begin/commit
    /// markers) reaches disk before the commit is acknowledged.
    pub fn append_batch(&mut self, ops: Vec<Op>) -> Result<()> {
        for op in ops {
            self.write_entry(op)?;
        }
        self.sync()
    }

    /// Force buffered entries to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Flush buffered entries to the OS without an fsync
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Current logical file length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// LSN the next appended entry will receive
    pub fn next_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn write_entry(&mut self, op: Op) -> Result<u64> {
        let lsn = self.next_lsn;
        let entry = LogEntry::new(lsn, op);
        let bytes = entry.encode()?;

        self.writer.write_all(&bytes)?;
        self.next_lsn += 1;
        self.len += bytes.len() as u64;
        self.unsynced += 1;

        Ok(lsn)
    }

    fn maybe_sync(&mut self) -> Result<()> {
        match self.sync_strategy {
            SyncStrategy::EveryWrite => self.sync(),
            SyncStrategy::EveryNEntries { count } => {
                if self.unsynced >= count {
                    self.sync()
                } else {
                    Ok(())
                }
            }
        }
    }
}
