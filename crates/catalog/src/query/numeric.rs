//! Numeric predicate parsing and matching.
//!
//! `NumericPredicate` backs the `size:`, `files:`, `rating:` and similar
//! expert-query fields. `RangeFilter` backs the single-threshold numeric
//! inputs of the filter panel, which never fail: malformed input simply
//! turns the filter off.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// A parsed numeric predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericPredicate {
    kind: NumericPredicateKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumericPredicateKind {
    Comparison { op: ComparisonOp, value: f64 },
    Range { min: Option<f64>, max: Option<f64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Ne,
}

impl ComparisonOp {
    pub fn evaluate<T: PartialOrd>(self, left: &T, right: &T) -> bool {
        match self {
            Self::Lt => left < right,
            Self::Lte => left <= right,
            Self::Gt => left > right,
            Self::Gte => left >= right,
            Self::Eq => left == right,
            Self::Ne => left != right,
        }
    }
}

/// Which literal syntax a predicate accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralKind {
    Plain,
    Bytes,
}

impl NumericPredicate {
    /// Parses a predicate over plain numbers (`>4`, `2..5`, `=3.5`).
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_with(raw, LiteralKind::Plain)
    }

    /// Parses a predicate over byte sizes, accepting units (`>10mb`) and size
    /// keywords (`small`, `huge`, ...).
    pub fn parse_size(raw: &str) -> Result<Self> {
        Self::parse_with(raw, LiteralKind::Bytes)
    }

    fn parse_with(raw: &str, literal: LiteralKind) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::QueryParse(
                "numeric filter requires a value".to_string(),
            ));
        }

        if let Some((op, value_raw)) = parse_comparison(trimmed) {
            if literal == LiteralKind::Bytes && size_keyword(value_raw).is_some() {
                return Err(CatalogError::QueryParse(
                    "size keywords cannot be used with comparison operators".to_string(),
                ));
            }
            let value = parse_literal(value_raw, literal)?;
            return Ok(Self {
                kind: NumericPredicateKind::Comparison { op, value },
            });
        }

        if let Some((start_raw, end_raw)) = parse_range(trimmed) {
            let min = if start_raw.is_empty() {
                None
            } else {
                Some(parse_literal(start_raw, literal)?)
            };
            let max = if end_raw.is_empty() {
                None
            } else {
                Some(parse_literal(end_raw, literal)?)
            };
            if let (Some(start), Some(end)) = (min, max) {
                if start > end {
                    return Err(CatalogError::QueryParse(
                        "range start must be less than or equal to end".to_string(),
                    ));
                }
            }
            return Ok(Self {
                kind: NumericPredicateKind::Range { min, max },
            });
        }

        if literal == LiteralKind::Bytes {
            if let Some((min, max)) = size_keyword(trimmed) {
                return Ok(Self {
                    kind: NumericPredicateKind::Range {
                        min: min.map(|value| value as f64),
                        max: max.map(|value| value as f64),
                    },
                });
            }
        }

        Ok(Self {
            kind: NumericPredicateKind::Comparison {
                op: ComparisonOp::Eq,
                value: parse_literal(trimmed, literal)?,
            },
        })
    }

    pub fn matches(&self, value: f64) -> bool {
        match &self.kind {
            NumericPredicateKind::Comparison { op, value: right } => op.evaluate(&value, right),
            NumericPredicateKind::Range { min, max } => {
                if let Some(minimum) = min {
                    if value < *minimum {
                        return false;
                    }
                }
                if let Some(maximum) = max {
                    if value > *maximum {
                        return false;
                    }
                }
                true
            }
        }
    }

    pub fn kind(&self) -> &NumericPredicateKind {
        &self.kind
    }
}

/// Splits a leading comparison operator off `raw`.
pub fn parse_comparison(raw: &str) -> Option<(ComparisonOp, &str)> {
    for (operator, kind) in [
        ("<=", ComparisonOp::Lte),
        (">=", ComparisonOp::Gte),
        ("!=", ComparisonOp::Ne),
        ("<", ComparisonOp::Lt),
        (">", ComparisonOp::Gt),
        ("=", ComparisonOp::Eq),
    ] {
        if let Some(value) = raw.strip_prefix(operator) {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            return Some((kind, trimmed));
        }
    }
    None
}

fn parse_range(raw: &str) -> Option<(&str, &str)> {
    let split = raw.find("..")?;
    let start = raw[..split].trim();
    let end = raw[split + 2..].trim();
    if start.is_empty() && end.is_empty() {
        return None;
    }
    Some((start, end))
}

fn parse_literal(raw: &str, literal: LiteralKind) -> Result<f64> {
    match literal {
        LiteralKind::Plain => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| CatalogError::QueryParse(format!("expected a number in {raw:?}"))),
        LiteralKind::Bytes => parse_size_literal(raw).map(|bytes| bytes as f64),
    }
}

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

fn size_keyword(raw: &str) -> Option<(Option<u64>, Option<u64>)> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "empty" => Some((Some(0), Some(0))),
        "tiny" => Some((Some(0), Some(100 * KB))),
        "small" => Some((Some(100 * KB + 1), Some(MB))),
        "medium" => Some((Some(MB + 1), Some(50 * MB))),
        "large" => Some((Some(50 * MB + 1), Some(500 * MB))),
        "huge" => Some((Some(500 * MB + 1), Some(2048 * MB))),
        "gigantic" | "giant" => Some((Some(2048 * MB + 1), None)),
        _ => None,
    }
}

/// Parses a size literal such as `512`, `1.5mb` or `2 GB` into bytes.
pub fn parse_size_literal(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::QueryParse(
            "size: expected a number".to_string(),
        ));
    }

    let mut split = trimmed.len();
    for (index, ch) in trimmed.char_indices() {
        if ch.is_ascii_digit() || ch == '.' {
            continue;
        }
        split = index;
        break;
    }
    let (number_part, unit_part) = trimmed.split_at(split);
    if number_part.is_empty() {
        return Err(CatalogError::QueryParse(format!(
            "size: expected a numeric value in {raw:?}"
        )));
    }

    let value: f64 = number_part.parse().map_err(|_| {
        CatalogError::QueryParse(format!("size: failed to parse number in {raw:?}"))
    })?;
    let multiplier = size_unit_multiplier(unit_part)?;
    let bytes = (value * multiplier as f64).round();
    if !bytes.is_finite() || bytes < 0.0 {
        return Err(CatalogError::QueryParse(format!(
            "size: value {raw:?} is out of range"
        )));
    }

    if bytes > u64::MAX as f64 {
        Ok(u64::MAX)
    } else {
        Ok(bytes as u64)
    }
}

fn size_unit_multiplier(unit: &str) -> Result<u64> {
    match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" | "byte" | "bytes" => Ok(1),
        "k" | "kb" | "kib" | "kilobyte" | "kilobytes" => Ok(KB),
        "m" | "mb" | "mib" | "megabyte" | "megabytes" => Ok(MB),
        "g" | "gb" | "gib" | "gigabyte" | "gigabytes" => Ok(1024 * MB),
        "t" | "tb" | "tib" | "terabyte" | "terabytes" => Ok(1024_u64.pow(4)),
        _ => Err(CatalogError::QueryParse(format!(
            "unknown size unit: {unit}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Filter panel thresholds
// ---------------------------------------------------------------------------

/// A single-threshold numeric filter from the filter panel.
///
/// `check_max` selects `<=` (maximum) instead of `>=` (minimum).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeFilter {
    pub input: String,
    pub check_max: bool,
}

impl RangeFilter {
    pub fn new(input: impl Into<String>, check_max: bool) -> Self {
        Self {
            input: input.into(),
            check_max,
        }
    }

    /// Plain numeric threshold, or `None` when the input is empty or malformed.
    pub fn threshold(&self) -> Option<f64> {
        let trimmed = self.input.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
    }

    /// Byte threshold accepting size units; bare numbers are bytes.
    pub fn size_threshold(&self) -> Option<f64> {
        let trimmed = self.input.trim();
        if trimmed.is_empty() {
            return None;
        }
        parse_size_literal(trimmed).ok().map(|bytes| bytes as f64)
    }

    /// Compares `value` against a resolved threshold.
    pub fn passes(&self, threshold: f64, value: f64) -> bool {
        if self.check_max {
            value <= threshold
        } else {
            value >= threshold
        }
    }
}
