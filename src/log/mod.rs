//! Append-Only Log Module
//!
//! The single backing file of a table: every committed mutation (records,
//! index registry changes, transaction markers) is an entry in this log, and
//! opening a table replays it from the start.
//!
//! ## Responsibilities
//! - Append entries before any in-memory mutation becomes visible
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Crash recovery with transaction-boundary resolution
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Header: MAGIC "TBLG" (4) │ VERSION (2)   │
//! ├──────────────────────────────────────────┤
//! │ Entry 1                                  │
//! │ ┌─────────┬─────────┬────────┬─────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Payload │ │
//! │ └─────────┴─────────┴────────┴─────────┘ │
//! ├──────────────────────────────────────────┤
//! │ Entry 2 ...                              │
//! └──────────────────────────────────────────┘
//! ```

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{LogEntry, Op, ENTRY_HEADER_SIZE, FILE_HEADER_SIZE, MAGIC, VERSION};
pub use reader::LogReader;
pub use recovery::{LogRecovery, RecoveryResult};
pub use writer::LogWriter;
