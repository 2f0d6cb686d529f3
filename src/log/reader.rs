//! Log reader
//!
//! Sequential reader over log entries, tracking the byte offset of the end of
//! each successfully read entry so recovery can truncate a torn tail.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, TabulaError};

use super::entry::{LogEntry, ENTRY_HEADER_SIZE, FILE_HEADER_SIZE, MAGIC, VERSION};

/// Maximum accepted payload size (guards against a corrupt length field)
const MAX_PAYLOAD_SIZE: u32 = 256 * 1024 * 1024;

/// Reads entries sequentially from a log file
pub struct LogReader {
    reader: BufReader<File>,
    /// Offset just past the last successfully read entry
    offset: u64,
}

impl LogReader {
    /// Open a log file and validate its header
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut header = [0u8; FILE_HEADER_SIZE as usize];
        reader.read_exact(&mut header).map_err(|_| {
            TabulaError::Corruption("log file shorter than its header".to_string())
        })?;

        if &header[0..4] != MAGIC {
            return Err(TabulaError::Corruption(format!(
                "invalid log magic: expected TBLG, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes(header[4..6].try_into().unwrap());
        if version != VERSION {
            return Err(TabulaError::Corruption(format!(
                "unsupported log version: {}",
                version
            )));
        }

        Ok(Self {
            reader,
            offset: FILE_HEADER_SIZE,
        })
    }

    /// Read the next entry
    ///
    /// Returns:
    /// - `Ok(Some(entry))` — a valid entry
    /// - `Ok(None)` — clean end of file
    /// - `Err(Corruption)` — torn or corrupt tail starting at `offset()`
    pub fn next_entry(&mut self) -> Result<Option<LogEntry>> {
        let mut header = [0u8; ENTRY_HEADER_SIZE];

        // Distinguish clean EOF (zero bytes) from a torn header.
        match self.reader.read(&mut header[..1])? {
            0 => return Ok(None),
            _ => self.reader.read_exact(&mut header[1..]).map_err(|_| {
                TabulaError::Corruption("truncated entry header".to_string())
            })?,
        }

        let lsn = u64::from_le_bytes(header[0..8].try_into().unwrap());
        let crc = u32::from_le_bytes(header[8..12].try_into().unwrap());
        let len = u32::from_le_bytes(header[12..16].try_into().unwrap());

        if len > MAX_PAYLOAD_SIZE {
            return Err(TabulaError::Corruption(format!(
                "implausible entry length {} at offset {}",
                len, self.offset
            )));
        }

        let mut payload = vec![0u8; len as usize];
        self.reader
            .read_exact(&mut payload)
            .map_err(|_| TabulaError::Corruption("truncated entry payload".to_string()))?;

        if crc32fast::hash(&payload) != crc {
            return Err(TabulaError::Corruption(format!(
                "CRC mismatch at offset {}",
                self.offset
            )));
        }

        let entry = LogEntry::decode(lsn, &payload)?;
        self.offset += (ENTRY_HEADER_SIZE + payload.len()) as u64;

        Ok(Some(entry))
    }

    /// Offset just past the last successfully read entry
    pub fn offset(&self) -> u64 {
        self.offset
    }
}
