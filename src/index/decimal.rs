//! Decimal value parsing and ordering
//!
//! Column values are byte strings; decimal semantics parse the first
//! ASCII-whitespace-delimited token as an `f64`. Values that fail to parse
//! have no decimal interpretation: they are absent from decimal indexes and
//! fail every numeric comparison.

use std::cmp::Ordering;

/// Parse the decimal interpretation of a column value
///
/// Leading/trailing ASCII whitespace is ignored; only the first token is
/// considered. NaN is rejected so every parsed value totally orders.
pub fn parse_decimal(value: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(value).ok()?;
    let token = text.split_ascii_whitespace().next()?;
    let number: f64 = token.parse().ok()?;
    if number.is_nan() {
        return None;
    }
    Some(number)
}

/// An `f64` index key with a total order
///
/// NaN never enters an index (rejected by `parse_decimal`), so `total_cmp`
/// gives the ordering callers expect from numeric comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalKey(f64);

impl DecimalKey {
    pub fn new(value: f64) -> Self {
        // Normalize -0.0 so equal numbers share one bucket under total_cmp.
        Self(if value == 0.0 { 0.0 } else { value })
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Eq for DecimalKey {}

impl PartialOrd for DecimalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DecimalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
