//! FILENAME: core/pivot-engine/src/view.rs
//! Views - Renderable output for the charting layer.
//!
//! The renderer owns every visual concern. It only ever receives:
//! - `AggregatedView`: an ordered list of (key tuple, measure) rows
//! - `PivotGrid`: a dense grid where an absent combination is `None`,
//!   which is different from a recorded total of zero

use serde::Serialize;

use crate::cache::{DimensionValue, GroupKey};
use crate::definition::{AggregationType, Dimension};

// ============================================================================
// AGGREGATED VIEW
// ============================================================================

/// One output row of an aggregated view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    pub key: GroupKey,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedView {
    pub name: String,
    /// Names the components of every row's key, in order.
    pub dimensions: Vec<Dimension>,
    pub aggregation: AggregationType,
    pub rows: Vec<ViewRow>,
}

impl AggregatedView {
    pub fn empty(
        name: impl Into<String>,
        dimensions: Vec<Dimension>,
        aggregation: AggregationType,
    ) -> Self {
        AggregatedView {
            name: name.into(),
            dimensions,
            aggregation,
            rows: Vec::new(),
        }
    }

    /// An empty view is how "no data for this filter" reaches the renderer.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Sum of the measure column.
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }

    /// Looks up the measure for an exact key.
    pub fn value_of(&self, key: &[DimensionValue]) -> Option<f64> {
        self.rows.iter().find(|r| r.key.as_slice() == key).map(|r| r.value)
    }

    /// Rows whose key component at `position` equals `value`, in view order.
    pub fn rows_where<'a>(
        &'a self,
        position: usize,
        value: &'a DimensionValue,
    ) -> impl Iterator<Item = &'a ViewRow> + 'a {
        self.rows.iter().filter(move |r| r.key.get(position) == Some(value))
    }
}

// ============================================================================
// PIVOT GRID
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotGrid {
    pub name: String,
    pub row_dimension: Dimension,
    pub column_dimension: Dimension,
    pub row_labels: Vec<DimensionValue>,
    pub column_labels: Vec<DimensionValue>,
    /// `cells[row][column]`; `None` where no transaction was recorded.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotGrid {
    pub fn row_count(&self) -> usize {
        self.row_labels.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty() || self.column_labels.is_empty()
    }

    pub fn get(&self, row: &DimensionValue, column: &DimensionValue) -> Option<f64> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.column_labels.iter().position(|l| l == column)?;
        self.cells[r][c]
    }

    /// Sum over all non-null cells.
    pub fn total(&self) -> f64 {
        self.cells.iter().flatten().flatten().sum()
    }
}
