//! Weekly aggregation: explicit map-then-reduce over week buckets.
//!
//! Each record is folded into the accumulator of its `WeekKey`; means are
//! finalized only when the buckets are read out. Null cells are skipped by
//! the fold, so a field ends up null only if every day of its week was null.

use std::collections::BTreeMap;

use super::bucket::{week_key, WeekYearBasis};
use crate::domain::{NormalizedRecord, WeekKey, WeeklyAggregate};

/// Every non-null value one field saw during a week.
///
/// Values are summed in sorted order, so the result is bit-identical no
/// matter what order the days arrived in. NaN sorts last and propagates.
#[derive(Debug, Clone, Default)]
struct Column {
    values: Vec<f64>,
}

impl Column {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.values.push(v);
        }
    }

    fn sum(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        Some(sorted.iter().sum())
    }

    fn mean(&self) -> Option<f64> {
        self.sum().map(|s| s / self.values.len() as f64)
    }
}

/// Accumulator for one week bucket.
#[derive(Debug, Clone, Default)]
struct WeekAccumulator {
    days: usize,
    volume: Column,
    low: Column,
    high: Column,
    open: Column,
    close: Column,
    adjusted_close: Column,
}

impl WeekAccumulator {
    fn add(&mut self, record: &NormalizedRecord) {
        self.days += 1;
        self.volume.add(record.volume);
        self.low.add(record.low);
        self.high.add(record.high);
        self.open.add(record.open);
        self.close.add(record.close);
        self.adjusted_close.add(record.adjusted_close);
    }

    fn finish(&self, key: WeekKey) -> WeeklyAggregate {
        WeeklyAggregate {
            symbol: key.symbol,
            year: key.year,
            week: key.week,
            volume: self.volume.sum(),
            low: self.low.mean(),
            high: self.high.mean(),
            open: self.open.mean(),
            close: self.close.mean(),
            adjusted_close: self.adjusted_close.mean(),
        }
    }
}

/// Records folded into their week buckets, not yet reduced to rows.
#[derive(Debug, Clone, Default)]
pub struct WeekBuckets {
    buckets: BTreeMap<WeekKey, WeekAccumulator>,
}

impl WeekBuckets {
    /// Number of distinct weeks.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of records that landed in each week.
    pub fn day_counts(&self) -> BTreeMap<WeekKey, usize> {
        self.buckets
            .iter()
            .map(|(key, acc)| (key.clone(), acc.days))
            .collect()
    }

    /// Finalize means; one row per bucket, ordered by key.
    pub fn finish(self) -> Vec<WeeklyAggregate> {
        self.buckets
            .into_iter()
            .map(|(key, acc)| acc.finish(key))
            .collect()
    }
}

/// Groups records by `WeekKey` and reduces each group to a `WeeklyAggregate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeeklyAggregator {
    basis: WeekYearBasis,
}

impl WeeklyAggregator {
    pub fn new(basis: WeekYearBasis) -> Self {
        Self { basis }
    }

    pub fn basis(&self) -> WeekYearBasis {
        self.basis
    }

    /// Fold every record into the accumulator of its week.
    pub fn bucket(&self, records: &[NormalizedRecord]) -> WeekBuckets {
        let mut buckets: BTreeMap<WeekKey, WeekAccumulator> = BTreeMap::new();
        for record in records {
            buckets
                .entry(week_key(record, self.basis))
                .or_default()
                .add(record);
        }

        tracing::debug!(
            records = records.len(),
            weeks = buckets.len(),
            "bucketed records by week"
        );

        WeekBuckets { buckets }
    }

    /// One aggregate per distinct week present in `records`, ordered by key.
    ///
    /// Weeks with no records produce no row.
    pub fn aggregate(&self, records: &[NormalizedRecord]) -> Vec<WeeklyAggregate> {
        self.bucket(records).finish()
    }

    /// Number of records that landed in each week, keyed like `aggregate`.
    pub fn day_counts(&self, records: &[NormalizedRecord]) -> BTreeMap<WeekKey, usize> {
        self.bucket(records).day_counts()
    }
}
