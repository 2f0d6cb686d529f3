//! Condition definitions
//!
//! A condition is `(column, operator, operand, negate, allow_index)`.
//! Operators form a closed enum in two families: string operators work on raw
//! bytes and whitespace-delimited tokens, number operators on the decimal
//! interpretation of the value. Operand validation happens at construction,
//! so a built condition always evaluates cleanly.

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabulaError};
use crate::index::parse_decimal;

/// Canonical condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    // -------------------------------------------------------------------------
    // String family
    // -------------------------------------------------------------------------
    /// Value equals the operand
    Eq,
    /// Value contains the operand as a substring
    Contains,
    /// Value begins with the operand
    BeginsWith,
    /// Value ends with the operand
    EndsWith,
    /// Every operand token appears as a token of the value
    AllTokens,
    /// At least one operand token appears as a token of the value
    AnyToken,
    /// Value equals at least one operand token
    EqAnyToken,
    /// Value matches the operand as a regular expression
    Regex,

    // -------------------------------------------------------------------------
    // Number family
    // -------------------------------------------------------------------------
    /// Decimal value equals the operand
    NumEq,
    /// Decimal value is greater than the operand
    NumGt,
    /// Decimal value is greater than or equal to the operand
    NumGe,
    /// Decimal value is less than the operand
    NumLt,
    /// Decimal value is less than or equal to the operand
    NumLe,
    /// Decimal value lies in the inclusive range of the two operand tokens
    NumBetween,
    /// Decimal value equals at least one operand token
    NumAnyOf,
}

/// Operator family: which interpretation of the column value applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFamily {
    String,
    Number,
}

impl Operator {
    /// The family this operator belongs to
    pub fn family(self) -> OperatorFamily {
        match self {
            Operator::Eq
            | Operator::Contains
            | Operator::BeginsWith
            | Operator::EndsWith
            | Operator::AllTokens
            | Operator::AnyToken
            | Operator::EqAnyToken
            | Operator::Regex => OperatorFamily::String,
            Operator::NumEq
            | Operator::NumGt
            | Operator::NumGe
            | Operator::NumLt
            | Operator::NumLe
            | Operator::NumBetween
            | Operator::NumAnyOf => OperatorFamily::Number,
        }
    }
}

/// Operand in pre-validated, pre-parsed form
#[derive(Debug, Clone)]
enum ParsedOperand {
    /// Raw bytes (string operators other than regex)
    Raw,
    /// Compiled pattern
    Pattern(Regex),
    /// One decimal number
    Number(f64),
    /// Inclusive range
    Range(f64, f64),
    /// Set of decimal numbers
    Numbers(Vec<f64>),
}

/// A single query condition
#[derive(Debug, Clone)]
pub struct Condition {
    column: Vec<u8>,
    op: Operator,
    operand: Vec<u8>,
    negate: bool,
    allow_index: bool,
    parsed: ParsedOperand,
}

impl Condition {
    /// Build a condition, validating the operand for the operator
    ///
    /// Fails with `InvalidQuery` on an invalid regex, a non-numeric operand
    /// for a number operator, or a `NumBetween` operand that is not exactly
    /// two numeric tokens.
    pub fn new(
        column: impl Into<Vec<u8>>,
        op: Operator,
        operand: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let operand = operand.into();

        let parsed = match op {
            Operator::Regex => {
                let pattern = std::str::from_utf8(&operand).map_err(|_| {
                    TabulaError::InvalidQuery("regex operand is not valid UTF-8".to_string())
                })?;
                let regex = Regex::new(pattern).map_err(|e| {
                    TabulaError::InvalidQuery(format!("invalid regex operand: {}", e))
                })?;
                ParsedOperand::Pattern(regex)
            }
            Operator::NumEq
            | Operator::NumGt
            | Operator::NumGe
            | Operator::NumLt
            | Operator::NumLe => {
                let number = parse_decimal(&operand).ok_or_else(|| {
                    TabulaError::InvalidQuery(format!(
                        "numeric operator needs a numeric operand, got {:?}",
                        String::from_utf8_lossy(&operand)
                    ))
                })?;
                ParsedOperand::Number(number)
            }
            Operator::NumBetween => {
                let numbers = parse_number_tokens(&operand)?;
                if numbers.len() != 2 {
                    return Err(TabulaError::InvalidQuery(format!(
                        "between needs exactly two numeric tokens, got {}",
                        numbers.len()
                    )));
                }
                let (lo, hi) = (numbers[0].min(numbers[1]), numbers[0].max(numbers[1]));
                ParsedOperand::Range(lo, hi)
            }
            Operator::NumAnyOf => {
                let numbers = parse_number_tokens(&operand)?;
                if numbers.is_empty() {
                    return Err(TabulaError::InvalidQuery(
                        "equals-any-of needs at least one numeric token".to_string(),
                    ));
                }
                ParsedOperand::Numbers(numbers)
            }
            _ => ParsedOperand::Raw,
        };

        Ok(Self {
            column: column.into(),
            op,
            operand,
            negate: false,
            allow_index: true,
            parsed,
        })
    }

    /// Negate the condition
    pub fn negate(mut self) -> Self {
        self.negate = true;
        self
    }

    /// Forbid index use; the condition is always post-filtered
    pub fn no_index(mut self) -> Self {
        self.allow_index = false;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn column(&self) -> &[u8] {
        &self.column
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn operand(&self) -> &[u8] {
        &self.operand
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub fn allow_index(&self) -> bool {
        self.allow_index
    }

    /// Parsed numeric operand, for single-number operators
    pub fn operand_number(&self) -> Option<f64> {
        match self.parsed {
            ParsedOperand::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Parsed inclusive range, for `NumBetween`
    pub fn operand_range(&self) -> Option<(f64, f64)> {
        match self.parsed {
            ParsedOperand::Range(lo, hi) => Some((lo, hi)),
            _ => None,
        }
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluate the condition against a column value, applying negation
    ///
    /// `None` (column absent from the record) fails every operator before
    /// negation; a negated condition therefore matches it.
    pub fn matches(&self, value: Option<&[u8]>) -> bool {
        let hit = value.map_or(false, |v| self.matches_value(v));
        hit != self.negate
    }

    fn matches_value(&self, value: &[u8]) -> bool {
        match (&self.parsed, self.op) {
            (ParsedOperand::Raw, Operator::Eq) => value == self.operand.as_slice(),
            (ParsedOperand::Raw, Operator::Contains) => contains(value, &self.operand),
            (ParsedOperand::Raw, Operator::BeginsWith) => value.starts_with(&self.operand),
            (ParsedOperand::Raw, Operator::EndsWith) => value.ends_with(&self.operand),
            (ParsedOperand::Raw, Operator::AllTokens) => {
                tokens(&self.operand).all(|needle| tokens(value).any(|t| t == needle))
            }
            (ParsedOperand::Raw, Operator::AnyToken) => {
                tokens(&self.operand).any(|needle| tokens(value).any(|t| t == needle))
            }
            (ParsedOperand::Raw, Operator::EqAnyToken) => {
                tokens(&self.operand).any(|token| token == value)
            }
            (ParsedOperand::Pattern(regex), Operator::Regex) => regex.is_match(value),
            (&ParsedOperand::Number(operand), op) => match parse_decimal(value) {
                Some(number) => match op {
                    Operator::NumEq => number == operand,
                    Operator::NumGt => number > operand,
                    Operator::NumGe => number >= operand,
                    Operator::NumLt => number < operand,
                    Operator::NumLe => number <= operand,
                    _ => false,
                },
                // Unparsable values fail all numeric comparisons.
                None => false,
            },
            (&ParsedOperand::Range(lo, hi), Operator::NumBetween) => parse_decimal(value)
                .map_or(false, |number| number >= lo && number <= hi),
            (ParsedOperand::Numbers(numbers), Operator::NumAnyOf) => parse_decimal(value)
                .map_or(false, |number| numbers.iter().any(|&n| n == number)),
            // Construction pairs each operator with its parsed form.
            _ => false,
        }
    }
}

/// Split a byte string on ASCII whitespace
pub(crate) fn tokens(value: &[u8]) -> impl Iterator<Item = &[u8]> {
    value
        .split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty())
}

/// Substring search on raw bytes
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Parse every whitespace token of an operand as a number
fn parse_number_tokens(operand: &[u8]) -> Result<Vec<f64>> {
    tokens(operand)
        .map(|token| {
            parse_decimal(token).ok_or_else(|| {
                TabulaError::InvalidQuery(format!(
                    "non-numeric token {:?} in numeric operand",
                    String::from_utf8_lossy(token)
                ))
            })
        })
        .collect()
}
