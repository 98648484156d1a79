//! The analysis entity: a digit-decomposed sequence, the tests run on it,
//! and the deviation map those tests write back to.

pub mod duplicates;
pub mod frequency;
pub mod mantissa;
pub mod ranking;

use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, TestOptions};
use crate::error::BenfordError;
use crate::sequence::{extract, sanitize, AnalysisSet, DigitRecord, RawValue, SanitizedSequence};
use crate::types::{with_metadata, ComputationOutput, DigitTest};
use crate::BenfordResult;

pub use duplicates::{duplicates, DuplicateEntry};
pub use frequency::{
    analyze, BucketResult, Chart, ConfidenceBand, Conformity, MadThresholds, ResultTable,
};
pub use mantissa::{mantissas, MantissaSummary};
pub use ranking::{rank, DeviationMap, RankedBucket};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Result of one digit test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitTestOutput {
    pub test: DigitTest,
    pub sample_size: usize,
    pub mad: Decimal,
    pub mse: Decimal,
    pub conformity: Option<Conformity>,
    pub mad_thresholds: Option<MadThresholds>,
    pub top_deviations: Vec<RankedBucket>,
    pub table: ResultTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicatesOutput {
    pub sample_size: usize,
    pub duplicates: Vec<DuplicateEntry>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// A sequence prepared for Benford testing.
///
/// The deviation map starts empty; every test run with `map_back` replaces
/// the entry for its own test. Tests take `&mut self` for that reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    config: AnalysisConfig,
    sanitized: SanitizedSequence,
    set: AnalysisSet,
    deviation_map: DeviationMap,
}

impl Analysis {
    /// Sanitize and decompose `data`.
    ///
    /// Fails only when no record converts to a number.
    pub fn new(data: &[RawValue], config: AnalysisConfig) -> BenfordResult<Self> {
        let sanitized = sanitize(data, &config)?;
        let set = extract(&sanitized.values, config.decimals);
        tracing::info!(
            total = sanitized.total,
            dropped = sanitized.dropped(),
            excluded = set.excluded,
            "Initialized sequence with {} registries",
            set.len()
        );
        Ok(Self {
            config,
            sanitized,
            set,
            deviation_map: DeviationMap::new(),
        })
    }

    pub fn from_values(values: &[Decimal], config: AnalysisConfig) -> BenfordResult<Self> {
        let data: Vec<RawValue> = values.iter().copied().map(RawValue::from).collect();
        Self::new(&data, config)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn sanitized(&self) -> &SanitizedSequence {
        &self.sanitized
    }

    pub fn set(&self) -> &AnalysisSet {
        &self.set
    }

    pub fn records(&self) -> &[DigitRecord] {
        &self.set.records
    }

    /// Number of records in the analysis set.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn deviation_map(&self) -> &DeviationMap {
        &self.deviation_map
    }

    /// The result table of `test`, without ranking or mapping back.
    pub fn analyze(&self, test: DigitTest) -> BenfordResult<ResultTable> {
        analyze(&self.set, test)
    }

    /// Run `test`, rank its deviations and, with `map_back`, record them.
    pub fn run_test(
        &mut self,
        test: DigitTest,
        options: &TestOptions,
    ) -> BenfordResult<ComputationOutput<DigitTestOutput>> {
        let start = Instant::now();
        options.validate()?;

        let table = self.analyze(test)?;
        tracing::info!(test = %test, "Test performed on {} registries", table.sample_size);

        let mut warnings: Vec<String> = Vec::new();
        if self.sanitized.dropped() > 0 {
            warnings.push(format!(
                "{} of {} records were missing or not numeric and were dropped.",
                self.sanitized.dropped(),
                self.sanitized.total
            ));
        }
        if self.set.excluded > 0 {
            warnings.push(format!(
                "{} records have fewer than two significant digits at {} decimals and were excluded.",
                self.set.excluded, self.config.decimals
            ));
        }
        if table.sample_size < self.set.len() {
            warnings.push(format!(
                "{} records are too short for the {} test.",
                self.set.len() - table.sample_size,
                test.name()
            ));
        }

        let top_deviations = rank(&table, options.top_n, options.positive_only);
        if top_deviations.is_empty() {
            warnings.push("No bucket was found more often than expected.".into());
        }
        if options.map_back {
            self.deviation_map.record(test, &top_deviations);
        }

        let output = DigitTestOutput {
            test,
            sample_size: table.sample_size,
            mad: table.mad(),
            mse: table.mse(),
            conformity: table.conformity(),
            mad_thresholds: frequency::mad_thresholds(test),
            top_deviations,
            table,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        let assumptions = serde_json::json!({
            "decimals": self.config.decimals,
            "latin_format": self.config.latin_format,
            "positive_only": options.positive_only,
            "top_n": if test.truncates_ranking() { Some(options.top_n) } else { None },
            "z_statistic": "(|found - expected| - 1/(2N)) / sqrt(expected * (1 - expected) / N)",
            "conformity": "informational MAD bands, not a pass/fail test",
        });

        Ok(with_metadata(
            &format!("Benford's Law {} test (Z-statistic, MAD, MSE)", test.name()),
            &assumptions,
            warnings,
            elapsed,
            output,
        ))
    }

    pub fn first_digit(
        &mut self,
        options: &TestOptions,
    ) -> BenfordResult<ComputationOutput<DigitTestOutput>> {
        self.run_test(DigitTest::FirstDigit, options)
    }

    pub fn second_digit(
        &mut self,
        options: &TestOptions,
    ) -> BenfordResult<ComputationOutput<DigitTestOutput>> {
        self.run_test(DigitTest::SecondDigit, options)
    }

    pub fn first_two_digits(
        &mut self,
        options: &TestOptions,
    ) -> BenfordResult<ComputationOutput<DigitTestOutput>> {
        self.run_test(DigitTest::FirstTwoDigits, options)
    }

    pub fn first_three_digits(
        &mut self,
        options: &TestOptions,
    ) -> BenfordResult<ComputationOutput<DigitTestOutput>> {
        self.run_test(DigitTest::FirstThreeDigits, options)
    }

    pub fn last_two_digits(
        &mut self,
        options: &TestOptions,
    ) -> BenfordResult<ComputationOutput<DigitTestOutput>> {
        self.run_test(DigitTest::LastTwoDigits, options)
    }

    /// The `top_n` most repeated sanitized values.
    pub fn duplicates(&self, top_n: usize) -> BenfordResult<DuplicatesOutput> {
        if top_n == 0 {
            return Err(BenfordError::InvalidInput {
                field: "top_n".into(),
                reason: "Must be at least 1.".into(),
            });
        }
        let values = self.sanitized.decimals();
        tracing::info!("Test performed on {} registries", values.len());
        Ok(DuplicatesOutput {
            sample_size: values.len(),
            duplicates: duplicates(&values, top_n),
        })
    }

    pub fn mantissas(&self) -> BenfordResult<MantissaSummary> {
        mantissas(&self.sanitized.decimals())
    }

    /// Records whose pattern for `test` is one of the buckets the latest
    /// mapped run of `test` ranked. Empty if `test` has not been mapped.
    pub fn flagged_records(&self, test: DigitTest) -> Vec<&DigitRecord> {
        let Some(buckets) = self.deviation_map.get(test) else {
            return Vec::new();
        };
        self.set
            .records
            .iter()
            .filter(|r| r.bucket(test).is_some_and(|b| buckets.contains(&b)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
