//! Query Engine Module
//!
//! Condition-based filtering over the record store, with index-assisted
//! candidate selection, deterministic ordering, and result limiting.
//!
//! ## Responsibilities
//! - Represent queries: conditions, order spec, limit, output shaping
//! - Select candidate keys via the index manager or fall back to a scan
//! - Post-filter, sort, truncate, and expose results lazily

mod condition;
mod executor;
mod results;

pub use condition::{Condition, Operator, OperatorFamily};
pub use results::{ResultSet, Row};

pub(crate) use executor::execute;

/// Sort direction of an order spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Raw byte comparison, ascending
    LexicalAsc,
    /// Raw byte comparison, descending
    LexicalDesc,
    /// Decimal comparison, ascending (unparsable sorts smallest)
    NumericAsc,
    /// Decimal comparison, descending (unparsable sorts smallest)
    NumericDesc,
}

/// A query: ordered conditions, optional order spec, optional limit,
/// output-shaping flags
#[derive(Debug, Clone, Default)]
pub struct Query {
    conditions: Vec<Condition>,
    order: Option<(Vec<u8>, Direction)>,
    limit: Option<usize>,
    keys_only: bool,
    include_pk: bool,
}

impl Query {
    /// Create an empty query (matches every record)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Order results by a column
    ///
    /// The empty column name orders by the primary key itself.
    pub fn order_by(mut self, column: impl Into<Vec<u8>>, direction: Direction) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    /// Truncate results to the first `n`
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Yield primary keys only; records are never fetched
    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    /// Surface the primary key as a leading empty-named pseudo-column of each
    /// fetched record
    pub fn include_pk(mut self) -> Self {
        self.include_pk = true;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn order(&self) -> Option<(&[u8], Direction)> {
        self.order.as_ref().map(|(c, d)| (c.as_slice(), *d))
    }

    pub fn limit_count(&self) -> Option<usize> {
        self.limit
    }

    pub fn is_keys_only(&self) -> bool {
        self.keys_only
    }

    pub fn is_include_pk(&self) -> bool {
        self.include_pk
    }
}
