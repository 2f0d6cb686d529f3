//! Log entry definitions
//!
//! Defines the structure and binary codec of individual log entries.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TabulaError};
use crate::index::IndexKind;
use crate::store::Record;

/// Magic bytes at the start of every log file
pub const MAGIC: &[u8; 4] = b"TBLG";

/// Log file format version
pub const VERSION: u16 = 1;

/// File header size: magic (4) + version (2)
pub const FILE_HEADER_SIZE: u64 = 6;

/// Entry header size: LSN (8) + CRC (4) + payload length (4)
pub const ENTRY_HEADER_SIZE: usize = 16;

/// A single entry in the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to replay
    pub op: Op,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Insert or fully replace the record at `pk`
    Put { pk: Vec<u8>, record: Record },

    /// Remove the record at `pk`
    Delete { pk: Vec<u8> },

    /// Remove all records
    Clear,

    /// Declare an index on `column`
    IndexAdd { column: Vec<u8>, kind: IndexKind },

    /// Drop the index on `column`
    IndexRemove { column: Vec<u8>, kind: IndexKind },

    /// Start of a transaction batch
    TxnBegin { id: u64 },

    /// End of a committed transaction batch
    TxnCommit { id: u64 },

    /// Marker for an explicitly aborted transaction (nothing to replay)
    TxnAbort { id: u64 },
}

impl LogEntry {
    /// Create a new entry
    pub fn new(lsn: u64, op: Op) -> Self {
        Self { lsn, op }
    }

    /// Encode to bytes: `[lsn (8)][crc (4)][len (4)][payload]`
    ///
    /// The CRC covers the bincode payload only; LSN and length corruption is
    /// caught by the payload failing to decode or the CRC failing to match.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&self.op)
            .map_err(|e| TabulaError::Serialization(format!("log op encode: {}", e)))?;

        let crc = crc32fast::hash(&payload);

        let mut buf = Vec::with_capacity(ENTRY_HEADER_SIZE + payload.len());
        buf.extend_from_slice(&self.lsn.to_le_bytes());
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&payload);

        Ok(buf)
    }

    /// Decode a payload previously framed by `encode`
    ///
    /// The caller has already read the header and verified the CRC matches
    /// `crc32fast::hash(payload)`.
    pub fn decode(lsn: u64, payload: &[u8]) -> Result<Self> {
        let op = bincode::deserialize(payload)
            .map_err(|e| TabulaError::Corruption(format!("log op decode: {}", e)))?;
        Ok(Self { lsn, op })
    }
}
