//! FILENAME: core/pivot-engine/src/profile.rs
//! Dataset Profile - Shape and descriptive statistics of a loaded record set.
//!
//! Mirrors what an analyst checks before trusting the charts: table sizes,
//! the covered date span, how many transactions failed to resolve a store or
//! item, and count/mean/std/min/quartiles/max of the numeric columns.

use chrono::NaiveDate;
use serde::Serialize;

use engine::{FactTable, Item, Store, Transaction};

use crate::cache::AggregateAccumulator;

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: u64,
    pub mean: f64,
    /// Sample standard deviation; `None` for a single value.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Summarizes `values`; `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut acc = AggregateAccumulator::new();
        let mut sorted = Vec::new();
        for v in values {
            acc.add_number(v);
            sorted.push(v);
        }
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        Some(NumericSummary {
            count: acc.count,
            mean: acc.mean,
            std: acc.std_dev(),
            min: acc.min?,
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: acc.max?,
        })
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetProfile {
    pub transactions: usize,
    pub stores: usize,
    pub items: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub unmatched_store_rows: usize,
    pub unmatched_item_rows: usize,
    pub price: Option<NumericSummary>,
    pub item_count: Option<NumericSummary>,
    pub total_sales: Option<NumericSummary>,
}

impl DatasetProfile {
    pub fn compute(
        transactions: &[Transaction],
        stores: &[Store],
        items: &[Item],
        table: &FactTable,
    ) -> Self {
        let bounds = table.date_bounds();
        DatasetProfile {
            transactions: transactions.len(),
            stores: stores.len(),
            items: items.len(),
            first_date: bounds.map(|(lo, _)| lo),
            last_date: bounds.map(|(_, hi)| hi),
            unmatched_store_rows: table.unmatched_store_rows(),
            unmatched_item_rows: table.unmatched_item_rows(),
            price: NumericSummary::from_values(transactions.iter().map(|t| t.price)),
            item_count: NumericSummary::from_values(
                transactions.iter().map(|t| t.item_count as f64),
            ),
            total_sales: NumericSummary::from_values(table.rows().iter().map(|r| r.total_sales)),
        }
    }
}
