use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BenfordError;

/// The digit-position tests. Serialized as the short keys used by the
/// deviation map (`"FD"`, `"SD"`, `"FTD"`, `"F3D"`, `"LTD"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DigitTest {
    #[serde(rename = "FD", alias = "first_digit")]
    FirstDigit,
    #[serde(rename = "SD", alias = "second_digit")]
    SecondDigit,
    #[serde(rename = "FTD", alias = "first_two_digits")]
    FirstTwoDigits,
    #[serde(rename = "F3D", alias = "first_three_digits")]
    FirstThreeDigits,
    #[serde(rename = "LTD", alias = "last_two_digits")]
    LastTwoDigits,
}

impl DigitTest {
    pub const ALL: [DigitTest; 5] = [
        DigitTest::FirstDigit,
        DigitTest::SecondDigit,
        DigitTest::FirstTwoDigits,
        DigitTest::FirstThreeDigits,
        DigitTest::LastTwoDigits,
    ];

    /// Short key under which the deviation map stores this test.
    pub fn key(&self) -> &'static str {
        match self {
            Self::FirstDigit => "FD",
            Self::SecondDigit => "SD",
            Self::FirstTwoDigits => "FTD",
            Self::FirstThreeDigits => "F3D",
            Self::LastTwoDigits => "LTD",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstDigit => "first digit",
            Self::SecondDigit => "second digit",
            Self::FirstTwoDigits => "first two digits",
            Self::FirstThreeDigits => "first three digits",
            Self::LastTwoDigits => "last two digits",
        }
    }

    /// The full theoretical bucket domain, in bucket order.
    pub fn buckets(&self) -> Vec<Bucket> {
        match self {
            Self::FirstDigit => (1..=9).map(Bucket::Digits).collect(),
            Self::SecondDigit => (0..=9).map(Bucket::Digits).collect(),
            Self::FirstTwoDigits => (10..=99).map(Bucket::Digits).collect(),
            Self::FirstThreeDigits => (100..=999).map(Bucket::Digits).collect(),
            Self::LastTwoDigits => (0..=99).map(Bucket::code).collect(),
        }
    }

    pub fn bucket_count(&self) -> usize {
        match self {
            Self::FirstDigit => 9,
            Self::SecondDigit => 10,
            Self::FirstTwoDigits => 90,
            Self::FirstThreeDigits => 900,
            Self::LastTwoDigits => 100,
        }
    }

    /// Large-domain tests report only the top `n` deviations; the single
    /// digit tests always return the full ranking.
    pub fn truncates_ranking(&self) -> bool {
        matches!(
            self,
            Self::FirstTwoDigits | Self::FirstThreeDigits | Self::LastTwoDigits
        )
    }
}

impl fmt::Display for DigitTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for DigitTest {
    type Err = BenfordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fd" | "first_digit" | "first-digit" => Ok(Self::FirstDigit),
            "sd" | "second_digit" | "second-digit" => Ok(Self::SecondDigit),
            "ftd" | "first_two_digits" | "first-two-digits" => Ok(Self::FirstTwoDigits),
            "f3d" | "first_three_digits" | "first-three-digits" => Ok(Self::FirstThreeDigits),
            "ltd" | "last_two_digits" | "last-two-digits" => Ok(Self::LastTwoDigits),
            _ => Err(BenfordError::InvalidDigitKind(s.to_string())),
        }
    }
}

/// Numeric digit codes: 1, 2, 3 for the leading-digit tests, 22 for the
/// second digit and -2 for the last two digits.
impl TryFrom<i32> for DigitTest {
    type Error = BenfordError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::FirstDigit),
            2 => Ok(Self::FirstTwoDigits),
            3 => Ok(Self::FirstThreeDigits),
            22 => Ok(Self::SecondDigit),
            -2 => Ok(Self::LastTwoDigits),
            other => Err(BenfordError::InvalidDigitKind(other.to_string())),
        }
    }
}

/// One digit pattern within a test's domain.
///
/// Leading-digit tests key buckets by their integer value. The last-two-digits
/// test keys them by a zero-padded two character code, since `"07"` and `"7"`
/// are different patterns and codes order lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bucket {
    Digits(u32),
    Code(String),
}

impl Bucket {
    /// Two character code for a last-two-digits value in `0..=99`.
    pub fn code(value: u32) -> Bucket {
        Bucket::Code(format!("{:02}", value % 100))
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Digits(d) => write!(f, "{}", d),
            Bucket::Code(c) => write!(f, "{}", c),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
