use serde::{Deserialize, Serialize};

use crate::error::BenfordError;
use crate::BenfordResult;

/// Largest scale a `Decimal` can carry.
pub const MAX_DECIMALS: u32 = 28;

/// Default number of deviations reported by the large-domain tests.
pub const DEFAULT_TOP_N: usize = 20;

/// How a raw sequence is turned into an analysis set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Decimal places kept when scaling values to integers. Use 0 for
    /// integer data, 2 for currency.
    pub decimals: u32,
    /// Text values use `.` for thousands and `,` for decimals.
    pub latin_format: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            decimals: 2,
            latin_format: false,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> BenfordResult<()> {
        if self.decimals > MAX_DECIMALS {
            return Err(BenfordError::InvalidInput {
                field: "decimals".into(),
                reason: format!("Must be at most {MAX_DECIMALS}."),
            });
        }
        Ok(())
    }
}

/// Per-test ranking options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestOptions {
    /// Number of ranked buckets kept for the large-domain tests.
    pub top_n: usize,
    /// Rank only buckets found more often than expected.
    pub positive_only: bool,
    /// Record the ranked buckets in the analysis' deviation map.
    pub map_back: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            positive_only: true,
            map_back: true,
        }
    }
}

impl TestOptions {
    pub fn validate(&self) -> BenfordResult<()> {
        if self.top_n == 0 {
            return Err(BenfordError::InvalidInput {
                field: "top_n".into(),
                reason: "Must be at least 1.".into(),
            });
        }
        Ok(())
    }
}
