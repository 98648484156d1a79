//! Most frequently repeated values of a sequence.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    pub value: Decimal,
    pub count: u64,
    /// Share of the sequence, in percent.
    pub percent: Decimal,
}

/// Count repeated values and return the `top_n` most frequent, by count
/// descending. Equal counts are ordered by value.
///
/// Values are compared numerically, so `5` and `5.00` are one value.
pub fn duplicates(values: &[Decimal], top_n: usize) -> Vec<DuplicateEntry> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut counts: BTreeMap<Decimal, u64> = BTreeMap::new();
    for v in values {
        *counts.entry(v.normalize()).or_insert(0) += 1;
    }
    let n = Decimal::from(values.len() as u64);
    let mut entries: Vec<DuplicateEntry> = counts
        .into_iter()
        .map(|(value, count)| DuplicateEntry {
            value,
            count,
            percent: Decimal::from(count) / n * Decimal::ONE_HUNDRED,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(top_n);
    entries
}
