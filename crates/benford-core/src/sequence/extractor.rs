//! Digit decomposition of the scaled integer form of each value.
//!
//! Every value is multiplied by `10^decimals`, rounded, and truncated to an
//! unsigned integer. The digit patterns are then read off the decimal
//! representation of that integer, independent of magnitude.

use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::sequence::sanitizer::SanitizedValue;
use crate::types::{Bucket, DigitTest};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One surviving record of the analysis set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitRecord {
    /// Position of the record in the original sequence.
    pub index: usize,
    pub value: Decimal,
    pub scaled_int: u128,
    pub first_digit: u32,
    pub second_digit: u32,
    pub first_two_digits: u32,
    /// Absent when the scaled integer has fewer than three digits.
    pub first_three_digits: Option<u32>,
    /// Zero-padded two character code, `"00"` to `"99"`.
    pub last_two_digits: String,
}

impl DigitRecord {
    /// The bucket this record falls into for `test`, if it takes part in it.
    pub fn bucket(&self, test: DigitTest) -> Option<Bucket> {
        match test {
            DigitTest::FirstDigit => Some(Bucket::Digits(self.first_digit)),
            DigitTest::SecondDigit => Some(Bucket::Digits(self.second_digit)),
            DigitTest::FirstTwoDigits => Some(Bucket::Digits(self.first_two_digits)),
            DigitTest::FirstThreeDigits => self.first_three_digits.map(Bucket::Digits),
            DigitTest::LastTwoDigits => Some(Bucket::Code(self.last_two_digits.clone())),
        }
    }
}

/// The digit-decomposed sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSet {
    pub decimals: u32,
    pub records: Vec<DigitRecord>,
    /// Sanitized values left out because they have fewer than two
    /// significant digits once scaled.
    pub excluded: usize,
}

impl AnalysisSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `round(value * 10^decimals)` as an unsigned integer. Overflow, negative
/// values and anything else that cannot be truncated map to 0.
pub fn scale_to_int(value: Decimal, decimals: u32) -> u128 {
    Decimal::TEN
        .checked_powu(u64::from(decimals))
        .and_then(|factor| value.checked_mul(factor))
        .and_then(|scaled| u128::try_from(scaled.round()).ok())
        .unwrap_or(0)
}

/// Decimal digits of `n`, most significant first. `0` yields `[0]`.
pub fn decimal_digits(mut n: u128) -> Vec<u32> {
    let mut digits = Vec::with_capacity(39);
    loop {
        digits.push((n % 10) as u32);
        n /= 10;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

/// Decompose one value, or `None` when it has fewer than two leading digits.
pub fn decompose(index: usize, value: Decimal, decimals: u32) -> Option<DigitRecord> {
    let scaled_int = scale_to_int(value, decimals);
    let digits = decimal_digits(scaled_int);

    let first_digit = digits[0];
    let second_digit = *digits.get(1)?;
    let first_two_digits = first_digit * 10 + second_digit;
    if first_two_digits < 10 {
        return None;
    }
    let first_three_digits = digits.get(2).map(|third| first_two_digits * 10 + third);

    let n = digits.len();
    let last_two_digits = format!("{}{}", digits[n - 2], digits[n - 1]);

    Some(DigitRecord {
        index,
        value,
        scaled_int,
        first_digit,
        second_digit,
        first_two_digits,
        first_three_digits,
        last_two_digits,
    })
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Build the analysis set from sanitized values.
pub fn extract(values: &[SanitizedValue], decimals: u32) -> AnalysisSet {
    let records: Vec<DigitRecord> = values
        .iter()
        .filter_map(|v| decompose(v.index, v.value, decimals))
        .collect();
    let excluded = values.len() - records.len();
    if excluded > 0 {
        tracing::warn!(
            excluded,
            decimals,
            "records with fewer than two significant digits excluded"
        );
    }
    AnalysisSet {
        decimals,
        records,
        excluded,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decompose_currency_value() {
        let r = decompose(0, dec!(45.67), 2).unwrap();
        assert_eq!(r.scaled_int, 4567);
        assert_eq!(r.first_digit, 4);
        assert_eq!(r.second_digit, 5);
        assert_eq!(r.first_two_digits, 45);
        assert_eq!(r.first_three_digits, Some(456));
        assert_eq!(r.last_two_digits, "67");
    }

    #[test]
    fn test_small_value_excluded() {
        assert_eq!(scale_to_int(dec!(0.05), 0), 0);
        assert!(decompose(0, dec!(0.05), 0).is_none());
        assert!(decompose(0, dec!(7), 0).is_none());
    }

    #[test]
    fn test_two_digit_value_has_no_third_digit() {
        let r = decompose(3, dec!(0.12), 2).unwrap();
        assert_eq!(r.first_two_digits, 12);
        assert_eq!(r.first_three_digits, None);
        assert_eq!(r.last_two_digits, "12");
        assert_eq!(r.index, 3);
    }

    #[test]
    fn test_last_two_keeps_leading_zero() {
        let r = decompose(0, dec!(1205), 0).unwrap();
        assert_eq!(r.last_two_digits, "05");
        let r = decompose(0, dec!(300), 0).unwrap();
        assert_eq!(r.last_two_digits, "00");
    }

    #[test]
    fn test_bankers_rounding() {
        assert_eq!(scale_to_int(dec!(12.345), 2), 1234);
        assert_eq!(scale_to_int(dec!(12.355), 2), 1236);
    }

    #[test]
    fn test_negative_and_overflow_map_to_zero() {
        assert_eq!(scale_to_int(dec!(-45.67), 2), 0);
        assert_eq!(scale_to_int(Decimal::MAX, 2), 0);
    }

    #[test]
    fn test_first_two_independent_of_magnitude() {
        for v in [dec!(0.4567), dec!(45.67), dec!(456700)] {
            let r = decompose(0, v, 4).unwrap();
            assert_eq!(r.first_two_digits, 45, "value {}", v);
        }
    }

    #[test]
    fn test_extract_counts_exclusions() {
        let values: Vec<SanitizedValue> = [dec!(45.67), dec!(0.01), dec!(0.001), dec!(10)]
            .iter()
            .enumerate()
            .map(|(index, &value)| SanitizedValue { index, value })
            .collect();
        let set = extract(&values, 2);
        assert_eq!(set.len(), 2);
        assert_eq!(set.excluded, 2);
        assert_eq!(set.records[1].index, 3);
        assert_eq!(set.records[1].scaled_int, 1000);
    }

    #[test]
    fn test_decimal_digits() {
        assert_eq!(decimal_digits(0), vec![0]);
        assert_eq!(decimal_digits(907), vec![9, 0, 7]);
    }

    #[test]
    fn test_record_bucket_per_test() {
        let r = decompose(0, dec!(45.07), 2).unwrap();
        assert_eq!(r.bucket(DigitTest::FirstDigit), Some(Bucket::Digits(4)));
        assert_eq!(r.bucket(DigitTest::SecondDigit), Some(Bucket::Digits(5)));
        assert_eq!(r.bucket(DigitTest::FirstThreeDigits), Some(Bucket::Digits(450)));
        assert_eq!(
            r.bucket(DigitTest::LastTwoDigits),
            Some(Bucket::Code("07".into()))
        );
    }
}
