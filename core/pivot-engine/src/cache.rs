//! FILENAME: core/pivot-engine/src/cache.rs
//! Group Cache - Internal representation used while reducing a fact table.
//!
//! Architecture:
//! - Each fact row is projected onto a `GroupKey` (one `DimensionValue` per
//!   grouped dimension)
//! - Rows with equal keys feed one `AggregateAccumulator`
//! - Accumulators are finalized into plain numbers only when a view is built
//!
//! `DimensionValue` derives `Ord` from its declaration order and the inner
//! types, which is exactly the natural ordering views sort by: calendar enums
//! in canonical order, numbers and dates ascending, text lexically, and
//! `Missing` (an unresolved store or item name) after everything else.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;

use engine::{DayOfWeek, FactRow, Month};

use crate::definition::{AggregationType, Dimension};

// ============================================================================
// DIMENSION VALUE
// ============================================================================

/// One component of a group key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum DimensionValue {
    Date(NaiveDate),
    DayOfWeek(DayOfWeek),
    Month(Month),
    Number(i64),
    Text(Arc<str>),
    /// Left-join miss. Serialized as `null`.
    Missing,
}

impl DimensionValue {
    pub fn text(s: &str) -> Self {
        DimensionValue::Text(Arc::from(s))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DimensionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, DimensionValue::Missing)
    }
}

impl fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DimensionValue::DayOfWeek(d) => f.write_str(d.name()),
            DimensionValue::Month(m) => f.write_str(m.name()),
            DimensionValue::Number(n) => write!(f, "{}", n),
            DimensionValue::Text(s) => f.write_str(s),
            DimensionValue::Missing => f.write_str("(blank)"),
        }
    }
}

// ============================================================================
// GROUP KEY
// ============================================================================

/// A key representing a unique combination of dimension values.
/// Views group by at most three dimensions, so keys stay inline.
pub type GroupKey = SmallVec<[DimensionValue; 3]>;

/// Projects a fact row onto the given dimensions.
pub fn group_key(row: &FactRow, dimensions: &[Dimension]) -> GroupKey {
    dimensions.iter().map(|d| d.extract(row)).collect()
}

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Accumulator for computing aggregates incrementally.
/// Tracks enough state for the view reducers and for descriptive statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// For variance/stddev: sum of squared differences from mean.
    /// Using Welford's algorithm for numerical stability.
    pub m2: f64,
    pub mean: f64,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a numeric value to the accumulator.
    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));

        // Welford's algorithm for variance
        let delta = value - self.mean;
        self.mean += delta / (self.count as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Computes the final aggregate value.
    pub fn compute(&self, aggregation: AggregationType) -> f64 {
        match aggregation {
            AggregationType::Sum => self.sum,
            AggregationType::Average => {
                if self.count > 0 {
                    self.sum / (self.count as f64)
                } else {
                    0.0
                }
            }
        }
    }

    /// Sample standard deviation (n - 1), `None` below two values.
    pub fn std_dev(&self) -> Option<f64> {
        if self.count > 1 {
            Some((self.m2 / ((self.count - 1) as f64)).sqrt())
        } else {
            None
        }
    }
}

// ============================================================================
// GROUPED AGGREGATES
// ============================================================================

/// Accumulators keyed by group, built in one pass over the rows.
#[derive(Debug, Clone, Default)]
pub struct GroupedAggregates {
    groups: FxHashMap<GroupKey, AggregateAccumulator>,
}

impl GroupedAggregates {
    /// Groups `rows` by `dimensions`, accumulating `total_sales`.
    pub fn from_rows(rows: &[FactRow], dimensions: &[Dimension]) -> Self {
        let mut groups: FxHashMap<GroupKey, AggregateAccumulator> = FxHashMap::default();
        for row in rows {
            groups
                .entry(group_key(row, dimensions))
                .or_default()
                .add_number(row.total_sales);
        }
        GroupedAggregates { groups }
    }

    /// Groups already-reduced `(key, value)` pairs by the first `prefix_len`
    /// key components. Input is consumed in key order so floating point
    /// accumulation does not depend on hash iteration order.
    pub fn regroup(entries: Vec<(GroupKey, f64)>, prefix_len: usize) -> Self {
        let mut entries = entries;
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut groups: FxHashMap<GroupKey, AggregateAccumulator> = FxHashMap::default();
        for (key, value) in entries {
            let prefix: GroupKey = key.into_iter().take(prefix_len).collect();
            groups.entry(prefix).or_default().add_number(value);
        }
        GroupedAggregates { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&AggregateAccumulator> {
        self.groups.get(key)
    }

    /// Finalizes every group with `aggregation`, in unspecified order.
    pub fn finalize(self, aggregation: AggregationType) -> Vec<(GroupKey, f64)> {
        self.groups
            .into_iter()
            .map(|(key, acc)| (key, acc.compute(aggregation)))
            .collect()
    }
}
