//! Configuration for Tabula
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a Tabula table instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the backing log file
    pub path: PathBuf,

    /// Allow mutations; when false every mutating call fails with `ReadOnly`
    pub writable: bool,

    /// Create the backing file if it does not exist
    pub create: bool,

    /// Discard any existing contents on open
    pub truncate: bool,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the log
    ///
    /// Defaults to `EveryWrite`, so every acknowledged mutation survives a
    /// crash. `EveryNEntries` trades that for throughput: up to N
    /// acknowledged single-op mutations can be lost, and callers opt into
    /// that window explicitly. Transaction commits always sync regardless of
    /// the strategy.
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Tuning Hints
    // -------------------------------------------------------------------------
    // Accepted as opaque performance hints. The log-structured backend
    // treats them as advisory; they are stored so a future paged backend
    // can honor them without an API change.
    /// Expected number of records (hash bucket hint)
    pub bucket_count: usize,

    /// Record cache size hint, in entries
    pub cache_size: usize,

    /// Power-of-two record alignment hint
    pub alignment_power: u8,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy)]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest; the default)
    EveryWrite,

    /// fsync after N unsynced entries; up to N acknowledged single-op
    /// mutations can be lost on a crash
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./tabula.tdb"),
            writable: true,
            create: true,
            truncate: false,
            sync_strategy: SyncStrategy::EveryWrite,
            bucket_count: 131_071,
            cache_size: 0,
            alignment_power: 4,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set whether mutations are allowed
    pub fn writable(mut self, writable: bool) -> Self {
        self.config.writable = writable;
        self
    }

    /// Set whether to create the backing file if missing
    pub fn create(mut self, create: bool) -> Self {
        self.config.create = create;
        self
    }

    /// Set whether to discard existing contents on open
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.config.truncate = truncate;
        self
    }

    /// Set the log sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the expected-record-count hint
    pub fn bucket_count(mut self, count: usize) -> Self {
        self.config.bucket_count = count;
        self
    }

    /// Set the record cache size hint (in entries)
    pub fn cache_size(mut self, size: usize) -> Self {
        self.config.cache_size = size;
        self
    }

    /// Set the power-of-two alignment hint
    pub fn alignment_power(mut self, power: u8) -> Self {
        self.config.alignment_power = power;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
