//! Ordering of buckets by Z-statistic and the per-test deviation map.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analysis::frequency::ResultTable;
use crate::types::{Bucket, DigitTest};

/// A bucket selected by the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedBucket {
    pub bucket: Bucket,
    pub expected: Decimal,
    pub found: Decimal,
    pub dif: Decimal,
    pub z_test: Decimal,
}

/// Buckets of `table` ordered by descending Z-statistic.
///
/// With `positive_only`, buckets found less often than expected are left
/// out. The ranking is cut to `top_n` entries only for tests with large
/// bucket domains.
pub fn rank(table: &ResultTable, top_n: usize, positive_only: bool) -> Vec<RankedBucket> {
    let mut ranked: Vec<RankedBucket> = table
        .rows
        .iter()
        .filter(|r| !positive_only || r.dif > Decimal::ZERO)
        .map(|r| RankedBucket {
            bucket: r.bucket.clone(),
            expected: r.expected,
            found: r.found,
            dif: r.dif,
            z_test: r.z_test,
        })
        .collect();
    // stable: equal Z keeps bucket order
    ranked.sort_by(|a, b| b.z_test.cmp(&a.z_test));
    if table.test.truncates_ranking() {
        ranked.truncate(top_n);
    }
    ranked
}

/// Highest-deviation buckets of the latest run of each test.
///
/// Each run that maps back replaces the entry for its own test and leaves
/// the others untouched. Not synchronised: tests on one analysis are
/// expected to run sequentially.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviationMap {
    entries: BTreeMap<DigitTest, Vec<Bucket>>,
}

impl DeviationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, test: DigitTest, ranked: &[RankedBucket]) {
        self.entries
            .insert(test, ranked.iter().map(|r| r.bucket.clone()).collect());
    }

    pub fn get(&self, test: DigitTest) -> Option<&[Bucket]> {
        self.entries.get(&test).map(Vec::as_slice)
    }

    pub fn contains(&self, test: DigitTest, bucket: &Bucket) -> bool {
        self.get(test).is_some_and(|b| b.contains(bucket))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DigitTest, &Vec<Bucket>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::frequency::BucketResult;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn row(bucket: Bucket, dif: Decimal, z: Decimal) -> BucketResult {
        BucketResult {
            bucket,
            expected: dec!(0.01),
            found: dec!(0.01) + dif,
            counts: 0,
            dif,
            abs_dif: dif.abs(),
            z_test: z,
            significant: false,
            p_value: None,
        }
    }

    fn last_two_table() -> ResultTable {
        let rows = (0u32..=99)
            .map(|i| {
                let dif = if i % 2 == 0 { dec!(0.001) } else { dec!(-0.001) };
                row(Bucket::code(i), dif, Decimal::from(i))
            })
            .collect();
        ResultTable {
            test: DigitTest::LastTwoDigits,
            sample_size: 1000,
            rows,
        }
    }

    #[test]
    fn test_positive_only_top_five() {
        let ranked = rank(&last_two_table(), 5, true);
        assert_eq!(ranked.len(), 5);
        assert!(ranked.iter().all(|r| r.dif > Decimal::ZERO));
        assert!(ranked.windows(2).all(|w| w[0].z_test >= w[1].z_test));
        assert_eq!(ranked[0].bucket, Bucket::Code("98".into()));
    }

    #[test]
    fn test_all_deviations() {
        let ranked = rank(&last_two_table(), 3, false);
        let keys: Vec<String> = ranked.iter().map(|r| r.bucket.to_string()).collect();
        assert_eq!(keys, vec!["99", "98", "97"]);
    }

    #[test]
    fn test_single_digit_tests_not_truncated() {
        let rows = (1u32..=9)
            .map(|d| row(Bucket::Digits(d), dec!(0.01), Decimal::from(d)))
            .collect();
        let table = ResultTable {
            test: DigitTest::FirstDigit,
            sample_size: 100,
            rows,
        };
        let ranked = rank(&table, 2, true);
        assert_eq!(ranked.len(), 9);
        assert_eq!(ranked[0].bucket, Bucket::Digits(9));
    }

    #[test]
    fn test_ties_keep_bucket_order() {
        let rows = (1u32..=9)
            .map(|d| row(Bucket::Digits(d), dec!(0.01), dec!(1)))
            .collect();
        let table = ResultTable {
            test: DigitTest::FirstDigit,
            sample_size: 100,
            rows,
        };
        let ranked = rank(&table, 20, true);
        assert_eq!(ranked[0].bucket, Bucket::Digits(1));
        assert_eq!(ranked[8].bucket, Bucket::Digits(9));
    }

    #[test]
    fn test_map_overwrites_per_test() {
        let mut map = DeviationMap::new();
        let table = last_two_table();
        map.record(DigitTest::LastTwoDigits, &rank(&table, 2, true));
        map.record(DigitTest::FirstDigit, &[]);
        map.record(DigitTest::LastTwoDigits, &rank(&table, 1, false));
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get(DigitTest::LastTwoDigits).unwrap(),
            &[Bucket::Code("99".into())]
        );
        assert!(map.get(DigitTest::FirstDigit).unwrap().is_empty());
        assert!(map.contains(DigitTest::LastTwoDigits, &Bucket::Code("99".into())));
        assert!(!map.contains(DigitTest::SecondDigit, &Bucket::Digits(1)));
    }

    #[test]
    fn test_map_serializes_with_short_keys() {
        let mut map = DeviationMap::new();
        map.record(DigitTest::FirstTwoDigits, &rank(&last_two_table(), 1, true));
        let j = serde_json::to_value(&map).unwrap();
        assert_eq!(j, serde_json::json!({ "FTD": ["98"] }));
    }
}
