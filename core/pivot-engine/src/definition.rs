//! FILENAME: core/pivot-engine/src/definition.rs
//! View Definition - The declarative description of one chart's data.
//!
//! This module contains all the types needed to DESCRIBE an aggregated view.
//! A definition says which dimensions to group by, how to reduce the measure,
//! how to order the result and whether to keep only the top N rows per scope.
//! The engine turns a definition plus a fact table into a view; definitions
//! themselves never touch data.

use serde::{Deserialize, Serialize};

use engine::{DayOfWeek, FactRow, Month};

use crate::cache::DimensionValue;

// ============================================================================
// DIMENSIONS
// ============================================================================

/// A categorical attribute of a fact row that views can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Date,
    DayOfWeek,
    Month,
    Quarter,
    Year,
    StoreName,
    ItemName,
}

impl Dimension {
    /// Column name used when the view is handed to the renderer.
    pub fn name(self) -> &'static str {
        match self {
            Dimension::Date => "date",
            Dimension::DayOfWeek => "day_of_week",
            Dimension::Month => "month",
            Dimension::Quarter => "quarter",
            Dimension::Year => "year",
            Dimension::StoreName => "store_name",
            Dimension::ItemName => "item_name",
        }
    }

    /// Reads this dimension's value from a fact row.
    pub fn extract(self, row: &FactRow) -> DimensionValue {
        match self {
            Dimension::Date => DimensionValue::Date(row.date),
            Dimension::DayOfWeek => DimensionValue::DayOfWeek(row.calendar.day_of_week),
            Dimension::Month => DimensionValue::Month(row.calendar.month),
            Dimension::Quarter => DimensionValue::Number(i64::from(row.calendar.quarter)),
            Dimension::Year => DimensionValue::Number(i64::from(row.calendar.year)),
            Dimension::StoreName => row
                .store_name
                .clone()
                .map_or(DimensionValue::Missing, DimensionValue::Text),
            Dimension::ItemName => row
                .item_name
                .clone()
                .map_or(DimensionValue::Missing, DimensionValue::Text),
        }
    }

    /// Every possible value in canonical order, for the bounded calendar
    /// dimensions. `None` for open-ended dimensions.
    pub fn complete_domain(self) -> Option<Vec<DimensionValue>> {
        match self {
            Dimension::DayOfWeek => Some(
                DayOfWeek::ALL
                    .iter()
                    .copied()
                    .map(DimensionValue::DayOfWeek)
                    .collect(),
            ),
            Dimension::Month => {
                Some(Month::ALL.iter().copied().map(DimensionValue::Month).collect())
            }
            Dimension::Quarter => Some((1..=4).map(DimensionValue::Number).collect()),
            _ => None,
        }
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported reducers for the `total_sales` measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AggregationType {
    #[default]
    Sum,
    Average,
}

/// Output ordering for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Key tuple in declared order; calendar dimensions canonically, names
    /// lexically, missing names last.
    #[default]
    Natural,
    /// Largest measure first; ties by natural key order.
    ValueDescending,
    /// Smallest measure first; ties by natural key order.
    ValueAscending,
}

/// Keep only the first `limit` rows (after sorting) within each value of
/// `scope`. A `scope` of `None` truncates the whole view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopN {
    pub limit: usize,
    pub scope: Option<Dimension>,
}

// ============================================================================
// VIEW DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// Stable identifier the renderer looks views up by.
    pub name: String,

    /// Group key dimensions, in output column order.
    pub group_by: Vec<Dimension>,

    /// The reducer applied per group.
    pub aggregation: AggregationType,

    /// Two-stage reduction: when non-empty, the measure is first summed per
    /// (`group_by` + `across`) and `aggregation` is then applied to those
    /// partial sums within each `group_by` group. Average quarterly sales is
    /// `group_by = [Quarter]`, `across = [Year]`, `aggregation = Average`.
    #[serde(default)]
    pub across: Vec<Dimension>,

    pub sort: SortOrder,

    #[serde(default)]
    pub top_n: Option<TopN>,
}

impl ViewDefinition {
    /// A summed view in natural order.
    pub fn sum(name: impl Into<String>, group_by: Vec<Dimension>) -> Self {
        ViewDefinition {
            name: name.into(),
            group_by,
            aggregation: AggregationType::Sum,
            across: Vec::new(),
            sort: SortOrder::Natural,
            top_n: None,
        }
    }

    /// Reduces per-`across` sums with `aggregation` instead of reducing raw rows.
    pub fn across(mut self, across: Vec<Dimension>, aggregation: AggregationType) -> Self {
        self.across = across;
        self.aggregation = aggregation;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationType) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn top_n(mut self, limit: usize, scope: Option<Dimension>) -> Self {
        self.top_n = Some(TopN { limit, scope });
        self
    }
}

// ============================================================================
// PIVOT DEFINITION
// ============================================================================

/// Which labels an axis of a pivot grid carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisDomain {
    /// Only values present in the data.
    #[default]
    Present,
    /// Every value of a bounded calendar dimension, present or not. Falls back
    /// to `Present` for open-ended dimensions.
    Complete,
}

/// A dense two-dimensional reshaping of one summed measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotDefinition {
    pub name: String,
    pub row: Dimension,
    pub column: Dimension,
    pub aggregation: AggregationType,
    pub row_domain: AxisDomain,
    pub column_domain: AxisDomain,
}

impl PivotDefinition {
    pub fn new(name: impl Into<String>, row: Dimension, column: Dimension) -> Self {
        PivotDefinition {
            name: name.into(),
            row,
            column,
            aggregation: AggregationType::Sum,
            row_domain: AxisDomain::Present,
            column_domain: AxisDomain::Present,
        }
    }

    pub fn with_domains(mut self, row_domain: AxisDomain, column_domain: AxisDomain) -> Self {
        self.row_domain = row_domain;
        self.column_domain = column_domain;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let def = ViewDefinition::sum("avg_q", vec![Dimension::Quarter])
            .across(vec![Dimension::Year], AggregationType::Average)
            .sorted(SortOrder::Natural);
        assert_eq!(def.aggregation, AggregationType::Average);
        assert_eq!(def.across, vec![Dimension::Year]);
        assert!(def.top_n.is_none());

        let top = ViewDefinition::sum("top", vec![Dimension::StoreName, Dimension::ItemName])
            .sorted(SortOrder::ValueDescending)
            .top_n(5, Some(Dimension::StoreName));
        assert_eq!(top.top_n, Some(TopN { limit: 5, scope: Some(Dimension::StoreName) }));
    }

    #[test]
    fn test_complete_domains() {
        assert_eq!(Dimension::DayOfWeek.complete_domain().map(|d| d.len()), Some(7));
        assert_eq!(Dimension::Month.complete_domain().map(|d| d.len()), Some(12));
        assert_eq!(Dimension::Quarter.complete_domain().map(|d| d.len()), Some(4));
        assert!(Dimension::StoreName.complete_domain().is_none());
    }

    #[test]
    fn test_dimension_serializes_snake_case() {
        let json = serde_json::to_string(&Dimension::DayOfWeek).unwrap();
        assert_eq!(json, "\"day_of_week\"");
        assert_eq!(Dimension::DayOfWeek.name(), "day_of_week");
    }
}
