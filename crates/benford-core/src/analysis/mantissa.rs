//! Mantissa summary: the fractional part of `log10(v)` for every value `v >= 1`.
//!
//! Benford data has mantissas uniform on `[0, 1)`, so their mean should sit
//! near 1/2 and their variance near 1/12. The sorted mantissas are kept for
//! an ordered-mantissa plot against rank.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::distribution::expected::log10;
use crate::error::BenfordError;
use crate::BenfordResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MantissaSummary {
    pub count: usize,
    /// Values below 1 that were not summarised.
    pub skipped: usize,
    pub mean: Decimal,
    pub variance: Decimal,
    pub expected_mean: Decimal,
    pub expected_variance: Decimal,
    /// Ascending.
    pub mantissas: Vec<Decimal>,
}

pub fn mantissa(value: Decimal) -> BenfordResult<Decimal> {
    let l = log10(value)?;
    Ok(l - l.floor())
}

pub fn mantissas(values: &[Decimal]) -> BenfordResult<MantissaSummary> {
    let mut ms = values
        .iter()
        .filter(|v| **v >= Decimal::ONE)
        .map(|v| mantissa(*v))
        .collect::<BenfordResult<Vec<Decimal>>>()?;
    if ms.is_empty() {
        return Err(BenfordError::InsufficientData(
            "Mantissas need at least one value of 1 or more.".into(),
        ));
    }
    ms.sort();

    let n = Decimal::from(ms.len() as u64);
    let mean = ms.iter().copied().sum::<Decimal>() / n;
    let variance = ms
        .iter()
        .map(|m| {
            let d = *m - mean;
            d * d
        })
        .sum::<Decimal>()
        / n;

    Ok(MantissaSummary {
        count: ms.len(),
        skipped: values.len() - ms.len(),
        mean,
        variance,
        expected_mean: dec!(0.5),
        expected_variance: Decimal::ONE / dec!(12),
        mantissas: ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_mantissa_values() {
        assert_eq!(mantissa(dec!(1000)).unwrap(), Decimal::ZERO);
        assert!(approx_eq(mantissa(dec!(20)).unwrap(), dec!(0.30103), dec!(0.00001)));
        assert!(approx_eq(mantissa(dec!(2)).unwrap(), dec!(0.30103), dec!(0.00001)));
    }

    #[test]
    fn test_small_values_skipped() {
        let out = mantissas(&[dec!(0.5), dec!(10), dec!(100)]).unwrap();
        assert_eq!(out.count, 2);
        assert_eq!(out.skipped, 1);
        assert!(approx_eq(out.mean, Decimal::ZERO, dec!(0.0000001)));
    }

    #[test]
    fn test_powers_of_two_near_uniform() {
        let mut v = Decimal::ONE;
        let mut data = Vec::new();
        for _ in 0..90 {
            v *= Decimal::TWO;
            data.push(v);
        }
        let out = mantissas(&data).unwrap();
        assert!(approx_eq(out.mean, dec!(0.5), dec!(0.05)), "mean {}", out.mean);
        assert!(approx_eq(out.variance, Decimal::ONE / dec!(12), dec!(0.02)));
        assert!(out.mantissas.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_no_eligible_values() {
        assert!(mantissas(&[dec!(0.2)]).is_err());
    }
}
