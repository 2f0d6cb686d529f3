//! # Tabula
//!
//! An embedded, disk-backed table database with:
//! - Records as ordered column → value byte-string mappings
//! - Secondary-column indexing (lexical and decimal)
//! - A condition-based query engine with ordering and limits
//! - Crash-safe transactions over an append-only log
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine                                │
//! │            (Single Writer / Multi Reader)                    │
//! └───────┬──────────────────┬──────────────────┬───────────────┘
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//!  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!  │ RecordStore │◄───│IndexManager │◄───│ QueryEngine │
//!  │ (Log+Table) │    │ (Lex/Dec)   │    │ (ResultSet) │
//!  └──────┬──────┘    └─────────────┘    └─────────────┘
//!         │
//!         ▼
//!  ┌─────────────┐
//!  │ Append Log  │
//!  │ (LSN + CRC) │
//!  └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod index;
pub mod log;
pub mod query;
pub mod store;

mod txn;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, SyncStrategy};
pub use engine::Engine;
pub use error::{Result, TabulaError};
pub use index::{IndexAction, IndexKind};
pub use query::{Condition, Direction, Operator, Query, ResultSet, Row};
pub use store::{Record, PK_COLUMN};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Tabula
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
