//! FILENAME: core/pivot-engine/src/engine.rs
//! Aggregation Engine - The calculation core that turns a fact table into views.
//!
//! Every chart's data comes out of the same operation, parameterized by its
//! `ViewDefinition`.
//!
//! Algorithm:
//! 1. Group fact rows by the definition's key tuple (plus `across` keys for
//!    two-stage reductions) and accumulate `total_sales`
//! 2. For two-stage reductions, regroup the per-`across` sums by the leading
//!    key components and reduce them again
//! 3. Finalize accumulators with the requested reducer
//! 4. Sort by the definition's policy with a natural-key tie-break
//! 5. Truncate to the top N rows inside each scope value
//!
//! Pivots reuse step 1 and then reshape into a dense grid.

use std::cmp::Ordering;

use engine::FactTable;

use crate::cache::{DimensionValue, GroupKey, GroupedAggregates};
use crate::definition::{
    AggregationType, AxisDomain, Dimension, PivotDefinition, SortOrder, TopN, ViewDefinition,
};
use crate::view::{AggregatedView, PivotGrid, ViewRow};

// ============================================================================
// VIEW CALCULATOR
// ============================================================================

/// Computes one aggregated view from a read-only fact table.
pub struct ViewCalculator<'a> {
    definition: &'a ViewDefinition,
    table: &'a FactTable,
}

impl<'a> ViewCalculator<'a> {
    pub fn new(definition: &'a ViewDefinition, table: &'a FactTable) -> Self {
        ViewCalculator { definition, table }
    }

    /// Executes the full calculation and returns the view.
    pub fn calculate(&self) -> AggregatedView {
        let def = self.definition;
        if self.table.is_empty() {
            return AggregatedView::empty(def.name.clone(), def.group_by.clone(), def.aggregation);
        }

        // Steps 1-3
        let entries = self.reduce();

        // Step 4
        let mut rows: Vec<ViewRow> = entries
            .into_iter()
            .map(|(key, value)| ViewRow { key, value })
            .collect();
        let scope = self.scope_position();
        rows.sort_by(|a, b| {
            let by_scope = match scope {
                Some(pos) => a.key[pos].cmp(&b.key[pos]),
                None => Ordering::Equal,
            };
            by_scope.then_with(|| compare_rows(a, b, def.sort))
        });

        // Step 5
        if let Some(top_n) = def.top_n {
            rows = truncate_per_scope(rows, top_n.limit, scope);
        }

        log::debug!("view '{}': {} rows from {} facts", def.name, rows.len(), self.table.len());

        AggregatedView {
            name: def.name.clone(),
            dimensions: def.group_by.clone(),
            aggregation: def.aggregation,
            rows,
        }
    }

    /// Groups and reduces the measure, returning one entry per group.
    fn reduce(&self) -> Vec<(GroupKey, f64)> {
        let def = self.definition;
        if def.across.is_empty() {
            return GroupedAggregates::from_rows(self.table.rows(), &def.group_by)
                .finalize(def.aggregation);
        }

        // Two-stage: sum per (group_by + across), then reduce those sums per group_by.
        let mut first_stage_keys = def.group_by.clone();
        first_stage_keys.extend(def.across.iter().copied().filter(|d| !def.group_by.contains(d)));

        let partial_sums = GroupedAggregates::from_rows(self.table.rows(), &first_stage_keys)
            .finalize(AggregationType::Sum);
        GroupedAggregates::regroup(partial_sums, def.group_by.len()).finalize(def.aggregation)
    }

    /// Position of the top-N scope inside the key tuple.
    fn scope_position(&self) -> Option<usize> {
        let TopN { scope, .. } = self.definition.top_n?;
        let scope = scope?;
        let position = self.definition.group_by.iter().position(|d| *d == scope);
        if position.is_none() {
            log::warn!(
                "view '{}': top-N scope {} is not grouped; truncating the whole view",
                self.definition.name,
                scope.name()
            );
        }
        position
    }
}

/// Orders two rows by the sort policy, falling back to natural key order so
/// the result is total and reproducible.
fn compare_rows(a: &ViewRow, b: &ViewRow, sort: SortOrder) -> Ordering {
    match sort {
        SortOrder::Natural => a.key.cmp(&b.key),
        SortOrder::ValueDescending => b.value.total_cmp(&a.value).then_with(|| a.key.cmp(&b.key)),
        SortOrder::ValueAscending => a.value.total_cmp(&b.value).then_with(|| a.key.cmp(&b.key)),
    }
}

/// Keeps the first `limit` rows of each run of equal scope values. Rows must
/// already be sorted with the scope as the leading criterion.
fn truncate_per_scope(rows: Vec<ViewRow>, limit: usize, scope: Option<usize>) -> Vec<ViewRow> {
    let Some(pos) = scope else {
        let mut rows = rows;
        rows.truncate(limit);
        return rows;
    };

    let mut kept = Vec::with_capacity(rows.len());
    let mut current: Option<DimensionValue> = None;
    let mut taken = 0usize;
    for row in rows {
        if current.as_ref() != Some(&row.key[pos]) {
            current = Some(row.key[pos].clone());
            taken = 0;
        }
        if taken < limit {
            kept.push(row);
            taken += 1;
        }
    }
    kept
}

// ============================================================================
// PIVOT
// ============================================================================

/// Builds the axis labels for one pivot dimension.
fn axis_labels(
    present: impl Iterator<Item = DimensionValue>,
    dimension: Dimension,
    domain: AxisDomain,
) -> Vec<DimensionValue> {
    if domain == AxisDomain::Complete {
        if let Some(all) = dimension.complete_domain() {
            return all;
        }
    }
    let mut labels: Vec<DimensionValue> = present.collect();
    labels.sort();
    labels.dedup();
    labels
}

/// Reshapes the (row, column) aggregation into a dense grid.
pub fn calculate_pivot(definition: &PivotDefinition, table: &FactTable) -> PivotGrid {
    let mut grid = PivotGrid {
        name: definition.name.clone(),
        row_dimension: definition.row,
        column_dimension: definition.column,
        row_labels: Vec::new(),
        column_labels: Vec::new(),
        cells: Vec::new(),
    };
    if table.is_empty() {
        return grid;
    }

    let groups = GroupedAggregates::from_rows(table.rows(), &[definition.row, definition.column]);
    let rows_present = table.rows().iter().map(|r| definition.row.extract(r));
    let cols_present = table.rows().iter().map(|r| definition.column.extract(r));
    grid.row_labels = axis_labels(rows_present, definition.row, definition.row_domain);
    grid.column_labels = axis_labels(cols_present, definition.column, definition.column_domain);

    grid.cells = grid
        .row_labels
        .iter()
        .map(|row_label| {
            grid.column_labels
                .iter()
                .map(|col_label| {
                    let key: GroupKey =
                        [row_label.clone(), col_label.clone()].into_iter().collect();
                    groups.get(&key).map(|acc| acc.compute(definition.aggregation))
                })
                .collect()
        })
        .collect();

    log::debug!(
        "pivot '{}': {}x{} grid from {} facts",
        definition.name,
        grid.row_count(),
        grid.column_count(),
        table.len()
    );
    grid
}

/// Calculates one aggregated view. This is the main entry point for the engine.
pub fn calculate_view(definition: &ViewDefinition, table: &FactTable) -> AggregatedView {
    ViewCalculator::new(definition, table).calculate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use engine::{build, DayOfWeek, Item, Month, Store, Transaction};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_table() -> FactTable {
        let stores = vec![Store::new(1, "North"), Store::new(2, "South")];
        let items = vec![
            Item::new(1, "Apples"),
            Item::new(2, "Oranges"),
            Item::new(3, "Pears"),
        ];
        let txs = vec![
            // 2024-01-01 Monday, 2024-01-02 Tuesday, 2024-01-07 Sunday
            Transaction::new(date(2024, 1, 7), 2, 1, 10.0, 2),
            Transaction::new(date(2024, 1, 1), 1, 1, 100.0, 1),
            Transaction::new(date(2024, 4, 2), 1, 2, 150.0, 1),
            Transaction::new(date(2024, 1, 2), 2, 3, 200.0, 1),
            Transaction::new(date(2024, 4, 1), 2, 2, 250.0, 1),
        ];
        build(&txs, &stores, &items).unwrap()
    }

    fn text(s: &str) -> DimensionValue {
        DimensionValue::text(s)
    }

    #[test]
    fn test_sum_by_store_descending() {
        let table = create_test_table();
        let def = ViewDefinition::sum("store_sales", vec![Dimension::StoreName])
            .sorted(SortOrder::ValueDescending);
        let view = calculate_view(&def, &table);

        assert_eq!(view.len(), 2);
        assert_eq!(view.rows[0].key[0], text("South"));
        assert_eq!(view.rows[0].value, 470.0);
        assert_eq!(view.rows[1].value, 250.0);
        assert_eq!(view.total(), table.total_sales());
    }

    #[test]
    fn test_weekday_order_is_calendar() {
        let table = create_test_table();
        let def = ViewDefinition::sum("weekday_sales", vec![Dimension::DayOfWeek]);
        let view = calculate_view(&def, &table);

        let days: Vec<DimensionValue> = view.rows.iter().map(|r| r.key[0].clone()).collect();
        assert_eq!(
            days,
            vec![
                DimensionValue::DayOfWeek(DayOfWeek::Monday),
                DimensionValue::DayOfWeek(DayOfWeek::Tuesday),
                DimensionValue::DayOfWeek(DayOfWeek::Sunday),
            ]
        );
        // Monday: 100 + 250
        assert_eq!(view.rows[0].value, 350.0);
    }

    #[test]
    fn test_value_ties_broken_by_key() {
        let stores = vec![Store::new(1, "Beta"), Store::new(2, "Alpha"), Store::new(3, "Gamma")];
        let items = vec![Item::new(1, "X")];
        let txs = vec![
            Transaction::new(date(2024, 1, 1), 1, 1, 5.0, 1),
            Transaction::new(date(2024, 1, 1), 3, 1, 9.0, 1),
            Transaction::new(date(2024, 1, 1), 2, 1, 5.0, 1),
        ];
        let table = build(&txs, &stores, &items).unwrap();
        let def =
            ViewDefinition::sum("s", vec![Dimension::StoreName]).sorted(SortOrder::ValueDescending);
        let names: Vec<String> = calculate_view(&def, &table)
            .rows
            .iter()
            .map(|r| r.key[0].to_string())
            .collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "Beta"]);

        let asc =
            ViewDefinition::sum("s", vec![Dimension::StoreName]).sorted(SortOrder::ValueAscending);
        let names: Vec<String> = calculate_view(&asc, &table)
            .rows
            .iter()
            .map(|r| r.key[0].to_string())
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn test_plain_average_is_over_rows() {
        let table = create_test_table();
        let def = ViewDefinition::sum("avg", vec![Dimension::StoreName])
            .with_aggregation(AggregationType::Average);
        let view = calculate_view(&def, &table);
        // North: (100 + 150) / 2
        assert_eq!(view.value_of(&[text("North")]), Some(125.0));
    }

    #[test]
    fn test_two_stage_average() {
        let stores = vec![Store::new(1, "S")];
        let items = vec![Item::new(1, "I")];
        let txs = vec![
            // Q1 2023: 40 + 60 = 100
            Transaction::new(date(2023, 1, 5), 1, 1, 40.0, 1),
            Transaction::new(date(2023, 2, 5), 1, 1, 60.0, 1),
            // Q1 2024: 300 in one row
            Transaction::new(date(2024, 3, 5), 1, 1, 300.0, 1),
        ];
        let table = build(&txs, &stores, &items).unwrap();
        let def = ViewDefinition::sum("avg_q", vec![Dimension::Quarter])
            .across(vec![Dimension::Year], AggregationType::Average);
        let view = calculate_view(&def, &table);

        assert_eq!(view.len(), 1);
        assert_eq!(view.rows[0].key.as_slice(), &[DimensionValue::Number(1)]);
        // Mean of yearly sums (100, 300), not of the raw rows (133.3).
        assert_eq!(view.rows[0].value, 200.0);
    }

    #[test]
    fn test_top_n_scoped() {
        let table = create_test_table();
        let def = ViewDefinition::sum("top", vec![Dimension::StoreName, Dimension::ItemName])
            .sorted(SortOrder::ValueDescending)
            .top_n(1, Some(Dimension::StoreName));
        let view = calculate_view(&def, &table);

        assert_eq!(view.len(), 2);
        assert_eq!(view.rows[0].key.as_slice(), &[text("North"), text("Oranges")]);
        assert_eq!(view.rows[1].key.as_slice(), &[text("South"), text("Oranges")]);
    }

    #[test]
    fn test_top_n_global() {
        let table = create_test_table();
        let def = ViewDefinition::sum("top", vec![Dimension::ItemName])
            .sorted(SortOrder::ValueDescending)
            .top_n(2, None);
        let view = calculate_view(&def, &table);
        assert_eq!(view.len(), 2);
        assert_eq!(view.rows[0].key[0], text("Oranges"));
        assert_eq!(view.rows[1].key[0], text("Pears"));
    }

    #[test]
    fn test_top_n_unknown_scope_truncates_globally() {
        let table = create_test_table();
        let def = ViewDefinition::sum("top", vec![Dimension::ItemName])
            .sorted(SortOrder::ValueDescending)
            .top_n(1, Some(Dimension::StoreName));
        assert_eq!(calculate_view(&def, &table).len(), 1);
    }

    #[test]
    fn test_empty_table_gives_empty_view() {
        let table = build(&[], &[Store::new(1, "S")], &[]).unwrap();
        let def = ViewDefinition::sum("daily", vec![Dimension::Date]);
        let view = calculate_view(&def, &table);
        assert!(view.is_empty());
        assert_eq!(view.dimensions, vec![Dimension::Date]);

        let heatmap = PivotDefinition::new("h", Dimension::DayOfWeek, Dimension::Month);
        let grid = calculate_pivot(&heatmap, &table);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_missing_names_group_last() {
        let stores = vec![Store::new(1, "Zed")];
        let items = vec![Item::new(1, "I")];
        let txs = vec![
            Transaction::new(date(2024, 1, 1), 7, 1, 1.0, 1),
            Transaction::new(date(2024, 1, 1), 1, 1, 2.0, 1),
        ];
        let table = build(&txs, &stores, &items).unwrap();
        let view = calculate_view(&ViewDefinition::sum("s", vec![Dimension::StoreName]), &table);
        assert_eq!(view.rows[0].key[0], text("Zed"));
        assert!(view.rows[1].key[0].is_missing());
        assert_eq!(view.total(), 3.0);
    }

    #[test]
    fn test_pivot_dense_with_nulls() {
        let table = create_test_table();
        let def = PivotDefinition::new("heatmap", Dimension::DayOfWeek, Dimension::Month)
            .with_domains(AxisDomain::Complete, AxisDomain::Present);
        let grid = calculate_pivot(&def, &table);

        assert_eq!(grid.row_count(), 7);
        assert_eq!(
            grid.column_labels,
            vec![DimensionValue::Month(Month::January), DimensionValue::Month(Month::April)]
        );
        let monday = DimensionValue::DayOfWeek(DayOfWeek::Monday);
        let wednesday = DimensionValue::DayOfWeek(DayOfWeek::Wednesday);
        let jan = DimensionValue::Month(Month::January);
        let apr = DimensionValue::Month(Month::April);
        assert_eq!(grid.get(&monday, &jan), Some(100.0));
        assert_eq!(grid.get(&monday, &apr), Some(250.0));
        assert_eq!(grid.get(&wednesday, &jan), None);
        assert_eq!(grid.total(), table.total_sales());
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let stores = vec![Store::new(1, "S")];
        let items = vec![Item::new(1, "I")];
        let mut txs: Vec<Transaction> = (1..=28)
            .map(|d| Transaction::new(date(2024, 2, d), 1, 1, d as f64, 1))
            .collect();
        let forward = build(&txs, &stores, &items).unwrap();
        txs.reverse();
        let backward = build(&txs, &stores, &items).unwrap();

        let def = ViewDefinition::sum("w", vec![Dimension::DayOfWeek]);
        let a = calculate_view(&def, &forward);
        let b = calculate_view(&def, &backward);
        let keys_a: Vec<_> = a.rows.iter().map(|r| r.key.clone()).collect();
        let keys_b: Vec<_> = b.rows.iter().map(|r| r.key.clone()).collect();
        assert_eq!(keys_a, keys_b);
        assert_eq!(keys_a[0][0], DimensionValue::DayOfWeek(DayOfWeek::Monday));
    }
}
