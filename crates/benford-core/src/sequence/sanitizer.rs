//! Normalises a raw input sequence into non-negative decimal values.
//!
//! Individual records that are missing or cannot be converted are dropped
//! and counted. Only a sequence in which no record survives is an error.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::BenfordError;
use crate::BenfordResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// One raw input record: a number, numeric text, a missing entry (`null`), or
/// any other JSON value, which is counted as unconvertible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Missing,
    Text(String),
    Number(Decimal),
    /// Booleans, nested values and numbers out of `Decimal` range.
    Other(serde_json::Value),
}

impl From<Decimal> for RawValue {
    fn from(v: Decimal) -> Self {
        RawValue::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Number(Decimal::from(v))
    }
}

/// Non-finite floats are treated as missing entries.
impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Decimal::try_from(v)
            .map(RawValue::Number)
            .unwrap_or(RawValue::Missing)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawValue::Missing)
    }
}

/// A cleaned value and the position of the record it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SanitizedValue {
    pub index: usize,
    pub value: Decimal,
}

/// Result of sanitization, with the counts needed to audit data loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedSequence {
    pub values: Vec<SanitizedValue>,
    pub total: usize,
    pub missing: usize,
    pub unconvertible: usize,
}

impl SanitizedSequence {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.missing + self.unconvertible
    }

    pub fn decimals(&self) -> Vec<Decimal> {
        self.values.iter().map(|v| v.value).collect()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Keep only the ASCII digits of `s`, then place the decimal point
/// `decimals` digits from the right.
///
/// `"1.234,56"` with two decimals becomes `1234.56`. A digit string no longer
/// than `decimals` is read as all fraction, so `"5"` becomes `0.5`.
fn parse_latin(s: &str, decimals: u32) -> Option<Decimal> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let scale = decimals.min(digits.len() as u32);
    let mantissa = i128::from_str(&digits).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, scale).ok()
}

/// Generic numeric conversion of text, accepting plain and scientific notation.
fn parse_generic(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn convert(raw: &RawValue, config: &AnalysisConfig) -> Option<Decimal> {
    match raw {
        RawValue::Missing | RawValue::Other(_) => None,
        RawValue::Number(v) => Some(*v),
        RawValue::Text(s) => {
            if config.latin_format {
                parse_latin(s, config.decimals)
            } else {
                parse_generic(s)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Clean `sequence` into decimal values, dropping records that are missing
/// or cannot be converted.
///
/// Negative values are passed through unchanged; callers are expected to
/// supply absolute values.
pub fn sanitize(sequence: &[RawValue], config: &AnalysisConfig) -> BenfordResult<SanitizedSequence> {
    config.validate()?;

    let mut values = Vec::with_capacity(sequence.len());
    let mut missing = 0usize;
    let mut unconvertible = 0usize;

    for (index, raw) in sequence.iter().enumerate() {
        if matches!(raw, RawValue::Missing) {
            missing += 1;
            continue;
        }
        match convert(raw, config) {
            Some(value) => values.push(SanitizedValue { index, value }),
            None => {
                tracing::debug!(index, ?raw, "dropping record that could not be converted");
                unconvertible += 1;
            }
        }
    }

    if values.is_empty() {
        return Err(BenfordError::TypeConversionError {
            total: sequence.len(),
        });
    }
    if missing + unconvertible > 0 {
        tracing::warn!(
            missing,
            unconvertible,
            kept = values.len(),
            "sanitization dropped records"
        );
    }

    Ok(SanitizedSequence {
        values,
        total: sequence.len(),
        missing,
        unconvertible,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
