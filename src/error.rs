//! Error types for Tabula
//!
//! Provides a unified error type for all operations.
//!
//! "Not found" is deliberately absent: a missing record is a normal outcome
//! and surfaces as `Option::None` from `get`/`delete`, never as an error.

use thiserror::Error;

/// Result type alias using TabulaError
pub type Result<T> = std::result::Result<T, TabulaError>;

/// Unified error type for Tabula operations
#[derive(Debug, Error)]
pub enum TabulaError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Log / Storage Errors
    // -------------------------------------------------------------------------
    #[error("log corruption detected: {0}")]
    Corruption(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store is opened read-only")]
    ReadOnly,

    // -------------------------------------------------------------------------
    // Record / Query Errors
    // -------------------------------------------------------------------------
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    // -------------------------------------------------------------------------
    // Transaction Errors
    // -------------------------------------------------------------------------
    #[error("transaction state error: {0}")]
    TransactionState(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}
