//! Theoretical Benford probabilities for every digit test.
//!
//! Leading patterns follow `P(d) = log10(1 + 1/d)`. The second digit sums the
//! first-two-digit probabilities sharing that second digit. Trailing digits
//! are modelled as uniform with weight 1/99 per code, `"00"` included.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::analysis::Chart;
use crate::error::BenfordError;
use crate::types::{Bucket, DigitTest};
use crate::BenfordResult;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn log10(x: Decimal) -> BenfordResult<Decimal> {
    x.checked_log10().ok_or_else(|| BenfordError::InvalidInput {
        field: "log10".into(),
        reason: format!("Undefined for {x}."),
    })
}

/// Probability of the leading pattern `d` (any number of digits).
pub fn leading_probability(d: u32) -> BenfordResult<Decimal> {
    if d == 0 {
        return Err(BenfordError::InvalidInput {
            field: "d".into(),
            reason: "Leading digit patterns start at 1.".into(),
        });
    }
    log10(Decimal::ONE + Decimal::ONE / Decimal::from(d))
}

/// Probability of `s` appearing as the second digit.
pub fn second_digit_probability(s: u32) -> BenfordResult<Decimal> {
    if s > 9 {
        return Err(BenfordError::InvalidInput {
            field: "s".into(),
            reason: "Second digit must be 0-9.".into(),
        });
    }
    (1u32..=9).map(|k| leading_probability(10 * k + s)).sum()
}

/// Probability of any single last-two-digits code.
pub fn last_two_probability() -> Decimal {
    Decimal::ONE / dec!(99)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Expected probability of one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRow {
    pub bucket: Bucket,
    pub expected: Decimal,
}

/// The theoretical distribution of one digit test over its full domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedTable {
    pub test: DigitTest,
    pub rows: Vec<ExpectedRow>,
}

impl ExpectedTable {
    pub fn get(&self, bucket: &Bucket) -> Option<Decimal> {
        self.rows
            .iter()
            .find(|r| &r.bucket == bucket)
            .map(|r| r.expected)
    }

    pub fn total(&self) -> Decimal {
        self.rows.iter().map(|r| r.expected).sum()
    }

    /// Expected-only series for a renderer.
    pub fn chart(&self) -> Chart {
        Chart {
            test: self.test,
            buckets: self.rows.iter().map(|r| r.bucket.clone()).collect(),
            expected: self.rows.iter().map(|r| r.expected).collect(),
            found: None,
            sample_size: None,
            band: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Build the expected Benford table for `test`.
pub fn expected(test: DigitTest) -> BenfordResult<ExpectedTable> {
    let rows = match test {
        DigitTest::FirstDigit | DigitTest::FirstTwoDigits | DigitTest::FirstThreeDigits => test
            .buckets()
            .into_iter()
            .map(|bucket| {
                let d = match &bucket {
                    Bucket::Digits(d) => *d,
                    Bucket::Code(c) => return Err(BenfordError::InvalidDigitKind(c.clone())),
                };
                Ok(ExpectedRow {
                    bucket,
                    expected: leading_probability(d)?,
                })
            })
            .collect::<BenfordResult<Vec<_>>>()?,
        DigitTest::SecondDigit => (0u32..=9)
            .map(|s| {
                Ok(ExpectedRow {
                    bucket: Bucket::Digits(s),
                    expected: second_digit_probability(s)?,
                })
            })
            .collect::<BenfordResult<Vec<_>>>()?,
        DigitTest::LastTwoDigits => {
            let p = last_two_probability();
            test.buckets()
                .into_iter()
                .map(|bucket| ExpectedRow {
                    bucket,
                    expected: p,
                })
                .collect()
        }
    };
    Ok(ExpectedTable { test, rows })
}

/// Build the expected table for a test named by key (`"FD"`, `"second_digit"`, ...).
pub fn expected_for(kind: &str) -> BenfordResult<ExpectedTable> {
    expected(kind.parse()?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_first_digit_p1_p9() {
        let t = expected(DigitTest::FirstDigit).unwrap();
        assert!(approx_eq(t.rows[0].expected, dec!(0.30103), dec!(0.00001)));
        assert!(approx_eq(t.rows[8].expected, dec!(0.04576), dec!(0.00001)));
    }

    #[test]
    fn test_leading_tables_sum_to_one() {
        for test in [
            DigitTest::FirstDigit,
            DigitTest::SecondDigit,
            DigitTest::FirstTwoDigits,
            DigitTest::FirstThreeDigits,
        ] {
            let t = expected(test).unwrap();
            assert!(
                approx_eq(t.total(), Decimal::ONE, dec!(0.000000001)),
                "{} sums to {}",
                test,
                t.total()
            );
        }
    }

    #[test]
    fn test_domain_sizes() {
        assert_eq!(expected(DigitTest::FirstDigit).unwrap().rows.len(), 9);
        assert_eq!(expected(DigitTest::SecondDigit).unwrap().rows.len(), 10);
        assert_eq!(expected(DigitTest::FirstTwoDigits).unwrap().rows.len(), 90);
        assert_eq!(expected(DigitTest::FirstThreeDigits).unwrap().rows.len(), 900);
        assert_eq!(expected(DigitTest::LastTwoDigits).unwrap().rows.len(), 100);
    }

    #[test]
    fn test_second_digit_zero_most_likely() {
        let t = expected(DigitTest::SecondDigit).unwrap();
        assert!(approx_eq(t.rows[0].expected, dec!(0.11968), dec!(0.00001)));
        assert!(approx_eq(t.rows[9].expected, dec!(0.08500), dec!(0.00001)));
        assert!(t.rows.windows(2).all(|w| w[0].expected > w[1].expected));
    }

    #[test]
    fn test_first_two_ten() {
        let t = expected(DigitTest::FirstTwoDigits).unwrap();
        let p10 = t.get(&Bucket::Digits(10)).unwrap();
        assert!(approx_eq(p10, dec!(0.041393), dec!(0.000001)));
    }

    #[test]
    fn test_last_two_double_zero_is_one_ninety_ninth() {
        let t = expected(DigitTest::LastTwoDigits).unwrap();
        let p00 = t.get(&Bucket::Code("00".into())).unwrap();
        assert_eq!(p00, Decimal::ONE / dec!(99));
        assert_ne!(p00, Decimal::ZERO);
        assert!(t.rows.iter().all(|r| r.expected == p00));
    }

    #[test]
    fn test_last_two_sums_to_hundred_ninety_ninths() {
        let t = expected(DigitTest::LastTwoDigits).unwrap();
        assert!(approx_eq(t.total(), dec!(100) / dec!(99), dec!(0.000000001)));
    }

    #[test]
    fn test_expected_for_unknown_kind() {
        assert!(matches!(
            expected_for("third_digit"),
            Err(BenfordError::InvalidDigitKind(_))
        ));
    }

    #[test]
    fn test_chart_has_no_observations() {
        let c = expected(DigitTest::FirstDigit).unwrap().chart();
        assert_eq!(c.buckets.len(), 9);
        assert!(c.found.is_none());
        assert!(c.band.is_none());
    }

    #[test]
    fn test_leading_zero_rejected() {
        assert!(leading_probability(0).is_err());
        assert!(second_digit_probability(10).is_err());
    }
}
