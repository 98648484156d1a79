//! Observed digit frequencies joined against the Benford expectation.
//!
//! For every bucket of a test's domain the table carries the observed count
//! and frequency, the difference from the expected probability and a
//! Z-statistic. Buckets that never occur are reported with zero counts.
//! MAD and MSE summarise the whole table; the MAD is then placed in the
//! test's conformity band, which is informational only.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::distribution::expected;
use crate::error::BenfordError;
use crate::sequence::AnalysisSet;
use crate::types::{Bucket, DigitTest};
use crate::BenfordResult;

/// Two-sided 5% critical value of the standard normal.
pub const Z_CRITICAL_5PCT: Decimal = dec!(1.96);

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One bucket of a digit test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketResult {
    pub bucket: Bucket,
    pub expected: Decimal,
    pub found: Decimal,
    pub counts: u64,
    pub dif: Decimal,
    pub abs_dif: Decimal,
    pub z_test: Decimal,
    pub significant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<Decimal>,
}

/// Per-bucket results of one digit test over its full domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub test: DigitTest,
    pub sample_size: usize,
    pub rows: Vec<BucketResult>,
}

/// Upper MAD limits of the conformity bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MadThresholds {
    pub close: Decimal,
    pub acceptable: Decimal,
    pub marginal: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conformity {
    Close,
    Acceptable,
    Marginal,
    Nonconformity,
}

/// Lower and upper limits of the 5% band around the expected frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub lower: Vec<Decimal>,
    pub upper: Vec<Decimal>,
}

/// Series handed to a renderer: expected line, found bars, 5% band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub test: DigitTest,
    pub buckets: Vec<Bucket>,
    pub expected: Vec<Decimal>,
    pub found: Option<Vec<Decimal>>,
    pub sample_size: Option<usize>,
    pub band: Option<ConfidenceBand>,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

fn standard_error(expected: Decimal, n: Decimal) -> Decimal {
    (expected * (Decimal::ONE - expected) / n)
        .sqrt()
        .unwrap_or(Decimal::ZERO)
}

/// `(|found - expected| - 1/(2N)) / sqrt(expected * (1 - expected) / N)`.
///
/// Zero when the expected probability leaves no variance.
pub fn z_statistic(abs_dif: Decimal, expected: Decimal, n: usize) -> Decimal {
    if n == 0 {
        return Decimal::ZERO;
    }
    let n = Decimal::from(n as u64);
    let se = standard_error(expected, n);
    if se.is_zero() {
        return Decimal::ZERO;
    }
    (abs_dif - Decimal::ONE / (Decimal::TWO * n)) / se
}

/// Two-sided normal p-value of a Z-statistic; non-positive Z gives 1.
#[cfg(feature = "significance")]
pub fn p_value(z: Decimal) -> Option<Decimal> {
    use statrs::distribution::{ContinuousCDF, Normal};

    let z = f64::try_from(z.max(Decimal::ZERO)).ok()?;
    let normal = Normal::new(0.0, 1.0).ok()?;
    let p = (2.0 * normal.sf(z)).min(1.0);
    Decimal::try_from(p).ok()
}

#[cfg(not(feature = "significance"))]
pub fn p_value(_z: Decimal) -> Option<Decimal> {
    None
}

/// `(lower, upper)` of the 5% band for one bucket.
pub fn confidence_limits(expected: Decimal, n: usize) -> (Decimal, Decimal) {
    if n == 0 {
        return (expected, expected);
    }
    let n = Decimal::from(n as u64);
    let margin = Z_CRITICAL_5PCT * standard_error(expected, n) + Decimal::ONE / (Decimal::TWO * n);
    (expected - margin, expected + margin)
}

/// Published MAD bands; the last-two-digits test has none.
pub fn mad_thresholds(test: DigitTest) -> Option<MadThresholds> {
    let (close, acceptable, marginal) = match test {
        DigitTest::FirstDigit => (dec!(0.006), dec!(0.012), dec!(0.015)),
        DigitTest::SecondDigit => (dec!(0.008), dec!(0.010), dec!(0.012)),
        DigitTest::FirstTwoDigits => (dec!(0.0012), dec!(0.0018), dec!(0.0022)),
        DigitTest::FirstThreeDigits => (dec!(0.00036), dec!(0.00044), dec!(0.00050)),
        DigitTest::LastTwoDigits => return None,
    };
    Some(MadThresholds {
        close,
        acceptable,
        marginal,
    })
}

pub fn classify(mad: Decimal, thresholds: &MadThresholds) -> Conformity {
    if mad <= thresholds.close {
        Conformity::Close
    } else if mad <= thresholds.acceptable {
        Conformity::Acceptable
    } else if mad <= thresholds.marginal {
        Conformity::Marginal
    } else {
        Conformity::Nonconformity
    }
}

impl ResultTable {
    pub fn get(&self, bucket: &Bucket) -> Option<&BucketResult> {
        self.rows.iter().find(|r| &r.bucket == bucket)
    }

    /// Mean absolute deviation over every bucket of the domain.
    pub fn mad(&self) -> Decimal {
        if self.rows.is_empty() {
            return Decimal::ZERO;
        }
        let total: Decimal = self.rows.iter().map(|r| r.abs_dif).sum();
        total / Decimal::from(self.rows.len() as u64)
    }

    /// Mean squared error over every bucket of the domain.
    pub fn mse(&self) -> Decimal {
        if self.rows.is_empty() {
            return Decimal::ZERO;
        }
        let total: Decimal = self.rows.iter().map(|r| r.abs_dif * r.abs_dif).sum();
        total / Decimal::from(self.rows.len() as u64)
    }

    pub fn conformity(&self) -> Option<Conformity> {
        mad_thresholds(self.test).map(|t| classify(self.mad(), &t))
    }

    pub fn chart(&self) -> Chart {
        let (lower, upper) = self
            .rows
            .iter()
            .map(|r| confidence_limits(r.expected, self.sample_size))
            .unzip();
        Chart {
            test: self.test,
            buckets: self.rows.iter().map(|r| r.bucket.clone()).collect(),
            expected: self.rows.iter().map(|r| r.expected).collect(),
            found: Some(self.rows.iter().map(|r| r.found).collect()),
            sample_size: Some(self.sample_size),
            band: Some(ConfidenceBand { lower, upper }),
        }
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Count the digit patterns of `set` for `test` and compare them with the
/// expected distribution.
///
/// Only records that have the pattern take part: the first-three-digits test
/// skips records with fewer than three digits.
pub fn analyze(set: &AnalysisSet, test: DigitTest) -> BenfordResult<ResultTable> {
    let mut counts: BTreeMap<Bucket, u64> = BTreeMap::new();
    for bucket in set.records.iter().filter_map(|r| r.bucket(test)) {
        *counts.entry(bucket).or_insert(0) += 1;
    }
    let n: u64 = counts.values().sum();
    if n == 0 {
        return Err(BenfordError::InsufficientData(format!(
            "No records with a {} pattern.",
            test.name()
        )));
    }
    let sample_size = n as usize;
    let n_dec = Decimal::from(n);

    let rows = expected(test)?
        .rows
        .into_iter()
        .map(|row| {
            let count = counts.get(&row.bucket).copied().unwrap_or(0);
            let found = Decimal::from(count) / n_dec;
            let dif = found - row.expected;
            let abs_dif = dif.abs();
            let z_test = z_statistic(abs_dif, row.expected, sample_size);
            BucketResult {
                bucket: row.bucket,
                expected: row.expected,
                found,
                counts: count,
                dif,
                abs_dif,
                z_test,
                significant: z_test > Z_CRITICAL_5PCT,
                p_value: p_value(z_test),
            }
        })
        .collect();

    Ok(ResultTable {
        test,
        sample_size,
        rows,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::extractor::decompose;
    use crate::sequence::DigitRecord;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    fn set_of(values: &[Decimal], decimals: u32) -> AnalysisSet {
        let records: Vec<DigitRecord> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| decompose(i, *v, decimals))
            .collect();
        AnalysisSet {
            decimals,
            records,
            excluded: 0,
        }
    }

    /// 1000 integers: 200 starting with "10", 10 for each of 80 other
    /// first-two-digit patterns.
    fn spiked_ten() -> Vec<Decimal> {
        let mut data = vec![dec!(1000); 200];
        for d in 20u32..=99 {
            data.extend(std::iter::repeat(Decimal::from(d * 10)).take(10));
        }
        data
    }

    #[test]
    fn test_spike_on_ten() {
        let table = analyze(&set_of(&spiked_ten(), 0), DigitTest::FirstTwoDigits).unwrap();
        assert_eq!(table.sample_size, 1000);
        let ten = table.get(&Bucket::Digits(10)).unwrap();
        assert_eq!(ten.counts, 200);
        assert_eq!(ten.found, dec!(0.2));
        assert!(approx_eq(ten.dif, dec!(0.1586), dec!(0.0001)));
        assert!(ten.z_test > dec!(20), "z = {}", ten.z_test);
        assert!(ten.significant);
    }

    #[test]
    fn test_missing_buckets_reported_as_zero() {
        let table = analyze(&set_of(&spiked_ten(), 0), DigitTest::FirstTwoDigits).unwrap();
        assert_eq!(table.rows.len(), 90);
        let eleven = table.get(&Bucket::Digits(11)).unwrap();
        assert_eq!(eleven.counts, 0);
        assert_eq!(eleven.found, Decimal::ZERO);
        assert_eq!(eleven.dif, -eleven.expected);
    }

    #[test]
    fn test_found_sums_to_one() {
        let table = analyze(&set_of(&spiked_ten(), 0), DigitTest::FirstDigit).unwrap();
        let total: Decimal = table.rows.iter().map(|r| r.found).sum();
        assert!(approx_eq(total, Decimal::ONE, dec!(0.0000001)));
        let counts: u64 = table.rows.iter().map(|r| r.counts).sum();
        assert_eq!(counts, 1000);
    }

    #[test]
    fn test_z_statistic_formula() {
        // p = 0.5, N = 100: se = 0.05, correction = 0.005
        let z = z_statistic(dec!(0.1), dec!(0.5), 100);
        assert!(approx_eq(z, dec!(1.9), dec!(0.0000001)));
        assert_eq!(z_statistic(dec!(0.1), Decimal::ONE, 100), Decimal::ZERO);
        assert_eq!(z_statistic(dec!(0.1), dec!(0.5), 0), Decimal::ZERO);
    }

    #[test]
    fn test_mad_and_mse() {
        let table = analyze(&set_of(&spiked_ten(), 0), DigitTest::SecondDigit).unwrap();
        let n = Decimal::from(table.rows.len() as u64);
        let mad: Decimal = table.rows.iter().map(|r| r.abs_dif).sum::<Decimal>() / n;
        let mse: Decimal = table.rows.iter().map(|r| r.abs_dif * r.abs_dif).sum::<Decimal>() / n;
        assert_eq!(table.mad(), mad);
        assert_eq!(table.mse(), mse);
        assert!(table.mse() < table.mad());
    }

    #[test]
    fn test_classify_bands() {
        let t = mad_thresholds(DigitTest::FirstDigit).unwrap();
        assert_eq!(classify(dec!(0.004), &t), Conformity::Close);
        assert_eq!(classify(dec!(0.010), &t), Conformity::Acceptable);
        assert_eq!(classify(dec!(0.014), &t), Conformity::Marginal);
        assert_eq!(classify(dec!(0.02), &t), Conformity::Nonconformity);
        assert!(mad_thresholds(DigitTest::LastTwoDigits).is_none());
    }

    #[test]
    fn test_uniform_first_digits_nonconforming() {
        let data: Vec<Decimal> = (1u32..=9)
            .flat_map(|d| std::iter::repeat(Decimal::from(d * 100)).take(50))
            .collect();
        let table = analyze(&set_of(&data, 0), DigitTest::FirstDigit).unwrap();
        assert_eq!(table.conformity(), Some(Conformity::Nonconformity));
    }

    #[test]
    fn test_first_three_skips_short_records() {
        let data = vec![dec!(12), dec!(123), dec!(1234)];
        let table = analyze(&set_of(&data, 0), DigitTest::FirstThreeDigits).unwrap();
        assert_eq!(table.sample_size, 2);
        assert_eq!(table.get(&Bucket::Digits(123)).unwrap().counts, 2);
    }

    #[test]
    fn test_empty_set_is_insufficient() {
        let set = AnalysisSet {
            decimals: 0,
            records: vec![],
            excluded: 0,
        };
        assert!(matches!(
            analyze(&set, DigitTest::FirstDigit),
            Err(BenfordError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_chart_band_brackets_expected() {
        let table = analyze(&set_of(&spiked_ten(), 0), DigitTest::FirstDigit).unwrap();
        let chart = table.chart();
        let band = chart.band.unwrap();
        assert_eq!(band.upper.len(), 9);
        for ((lo, hi), e) in band.lower.iter().zip(&band.upper).zip(&chart.expected) {
            assert!(lo < e && e < hi);
        }
        assert_eq!(chart.sample_size, Some(1000));
    }

    #[cfg(feature = "significance")]
    #[test]
    fn test_p_value() {
        let p = p_value(dec!(1.96)).unwrap();
        assert!(approx_eq(p, dec!(0.05), dec!(0.001)));
        assert_eq!(p_value(dec!(-1)).unwrap(), Decimal::ONE);
    }
}
