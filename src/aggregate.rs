//! Grouping and ranking primitives shared by every aggregation.
//!
//! An aggregation is always the same pipeline: group the records, compute
//! per-group statistics, drop groups below a minimum sample size, sort
//! descending, keep the first N. [`Ranking`] fixes that order so the
//! sample filter can never run after truncation.

use crate::types::{MissionRecord, NumericColumn};
use crate::util::quantile_sorted;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Records sharing one key, in input order.
#[derive(Debug, Clone)]
pub struct Group<'a, K> {
    pub key: K,
    pub members: Vec<&'a MissionRecord>,
}

impl<'a, K> Group<'a, K> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Non-null values of `column` among the members.
    pub fn values(&self, column: NumericColumn) -> Vec<f64> {
        self.members.iter().filter_map(|r| r.value(column)).collect()
    }

    pub fn summarize(&self, column: NumericColumn) -> Summary {
        Summary::of(self.members.iter().map(|r| r.value(column)))
    }
}

/// Group records by a key. Records whose key is `None` are left out.
/// Groups come back in ascending key order.
pub fn group_by<'a, K, F>(records: &'a [MissionRecord], key: F) -> Vec<Group<'a, K>>
where
    K: Ord,
    F: Fn(&MissionRecord) -> Option<K>,
{
    let mut groups: BTreeMap<K, Vec<&'a MissionRecord>> = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record) {
            groups.entry(k).or_default().push(record);
        }
    }
    groups
        .into_iter()
        .map(|(key, members)| Group { key, members })
        .collect()
}

/// Count, sum and mean of the non-null values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
}

impl Summary {
    pub fn of<I>(values: I) -> Summary
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let (count, sum) = values
            .into_iter()
            .flatten()
            .fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v));
        let mean = (count > 0).then(|| sum / count as f64);
        Summary { count, sum, mean }
    }
}

/// Keep rows whose sample count is at least `threshold`.
pub fn retain_min_samples<T>(rows: Vec<T>, threshold: usize, samples: impl Fn(&T) -> usize) -> Vec<T> {
    rows.into_iter().filter(|r| samples(r) >= threshold).collect()
}

/// Stable descending sort. NaN sorts last; equal keys keep input order.
pub fn sort_desc_by<T>(rows: &mut [T], key: impl Fn(&T) -> f64) {
    rows.sort_by(|a, b| desc_nan_last(key(a), key(b)));
}

fn desc_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

pub fn top_n<T>(mut rows: Vec<T>, n: usize) -> Vec<T> {
    rows.truncate(n);
    rows
}

/// The `n` most frequent keys, most frequent first, ties by ascending key.
pub fn top_keys_by_frequency<K, F>(records: &[MissionRecord], key: F, n: usize) -> Vec<K>
where
    K: Ord,
    F: Fn(&MissionRecord) -> Option<K>,
{
    let mut counted: Vec<(K, usize)> = group_by(records, key)
        .into_iter()
        .map(|g| {
            let len = g.len();
            (g.key, len)
        })
        .collect();
    sort_desc_by(&mut counted, |(_, c)| *c as f64);
    counted.into_iter().take(n).map(|(k, _)| k).collect()
}

/// Filter, sort and truncate in the one order aggregations allow.
pub struct Ranking<T> {
    pub min_samples: Option<usize>,
    pub samples: fn(&T) -> usize,
    pub sort_key: fn(&T) -> f64,
    pub limit: Option<usize>,
}

impl<T> Ranking<T> {
    pub fn by(sort_key: fn(&T) -> f64) -> Self {
        Ranking {
            min_samples: None,
            samples: |_| usize::MAX,
            sort_key,
            limit: None,
        }
    }

    pub fn min_samples(mut self, threshold: usize, samples: fn(&T) -> usize) -> Self {
        self.min_samples = Some(threshold);
        self.samples = samples;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn apply(&self, rows: Vec<T>) -> Vec<T> {
        let mut rows = match self.min_samples {
            Some(threshold) => retain_min_samples(rows, threshold, self.samples),
            None => rows,
        };
        sort_desc_by(&mut rows, self.sort_key);
        match self.limit {
            Some(n) => top_n(rows, n),
            None => rows,
        }
    }
}

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value within `q1 - 1.5 * IQR`.
    pub lower_whisker: f64,
    /// Largest value within `q3 + 1.5 * IQR`.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<BoxStats> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile_sorted(&sorted, 0.25)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = || sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
        let lower_whisker = inside().next().unwrap_or(q1);
        let upper_whisker = inside().last().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(BoxStats {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}
