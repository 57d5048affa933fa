//! FILENAME: core/pivot-engine/src/catalog.rs
//! View Catalog - The fixed set of named views the dashboard renders.
//!
//! Each chart is one declarative `ViewDefinition`; the catalog computes all of
//! them from a single filtered snapshot. Views share nothing mutable, so they
//! are fanned out across the rayon pool and collected back in catalog order.

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use engine::{AppliedFilter, EngineError, FactTable, FilterRequest};

use crate::definition::{
    AggregationType, AxisDomain, Dimension, PivotDefinition, SortOrder, ViewDefinition,
};
use crate::engine::{calculate_pivot, calculate_view};
use crate::view::{AggregatedView, PivotGrid};

/// Stable view names, as looked up by the renderer.
pub mod names {
    pub const DAILY_SALES: &str = "daily_sales";
    pub const WEEKDAY_SALES: &str = "weekday_sales";
    pub const MONTHLY_SALES: &str = "monthly_sales";
    pub const QUARTERLY_SALES: &str = "quarterly_sales";
    pub const AVERAGE_QUARTERLY_SALES: &str = "average_quarterly_sales";
    pub const STORE_SALES: &str = "store_sales";
    pub const ITEM_SALES: &str = "item_sales";
    pub const STORE_YEARLY_SALES: &str = "store_yearly_sales";
    pub const STORE_MONTHLY_SALES: &str = "store_monthly_sales";
    pub const STORE_WEEKDAY_SALES: &str = "store_weekday_sales";
    pub const TOP_ITEMS_PER_STORE: &str = "top_items_per_store";
    pub const WEEKDAY_MONTH_HEATMAP: &str = "weekday_month_heatmap";
}

pub const DEFAULT_TOP_ITEMS_PER_STORE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOptions {
    pub top_items_per_store: usize,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        CatalogOptions {
            top_items_per_store: DEFAULT_TOP_ITEMS_PER_STORE,
        }
    }
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone)]
pub struct ViewCatalog {
    views: Vec<ViewDefinition>,
    heatmap: PivotDefinition,
}

impl ViewCatalog {
    /// The dashboard's standard charts.
    pub fn standard(options: CatalogOptions) -> Self {
        use Dimension::*;

        let views = vec![
            ViewDefinition::sum(names::DAILY_SALES, vec![Date]),
            ViewDefinition::sum(names::WEEKDAY_SALES, vec![DayOfWeek]),
            ViewDefinition::sum(names::MONTHLY_SALES, vec![Month]),
            ViewDefinition::sum(names::QUARTERLY_SALES, vec![Year, Quarter]),
            ViewDefinition::sum(names::AVERAGE_QUARTERLY_SALES, vec![Quarter])
                .across(vec![Year], AggregationType::Average),
            ViewDefinition::sum(names::STORE_SALES, vec![StoreName])
                .sorted(SortOrder::ValueDescending),
            ViewDefinition::sum(names::ITEM_SALES, vec![ItemName])
                .sorted(SortOrder::ValueDescending),
            ViewDefinition::sum(names::STORE_YEARLY_SALES, vec![StoreName, Year]),
            ViewDefinition::sum(names::STORE_MONTHLY_SALES, vec![StoreName, Month]),
            ViewDefinition::sum(names::STORE_WEEKDAY_SALES, vec![StoreName, DayOfWeek]),
            ViewDefinition::sum(names::TOP_ITEMS_PER_STORE, vec![StoreName, ItemName])
                .sorted(SortOrder::ValueDescending)
                .top_n(options.top_items_per_store, Some(StoreName)),
        ];

        let heatmap = PivotDefinition::new(names::WEEKDAY_MONTH_HEATMAP, DayOfWeek, Month)
            .with_domains(AxisDomain::Complete, AxisDomain::Present);

        ViewCatalog { views, heatmap }
    }

    pub fn views(&self) -> &[ViewDefinition] {
        &self.views
    }

    pub fn heatmap(&self) -> &PivotDefinition {
        &self.heatmap
    }

    /// Computes every view and the heatmap from one snapshot.
    pub fn compute(&self, table: &FactTable) -> (Vec<AggregatedView>, PivotGrid) {
        rayon::join(
            || {
                self.views
                    .par_iter()
                    .map(|def| calculate_view(def, table))
                    .collect::<Vec<_>>()
            },
            || calculate_pivot(&self.heatmap, table),
        )
    }
}

impl Default for ViewCatalog {
    fn default() -> Self {
        Self::standard(CatalogOptions::default())
    }
}

// ============================================================================
// DASHBOARD
// ============================================================================

/// Everything the renderer needs for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub filter: AppliedFilter,
    pub fact_rows: usize,
    pub total_sales: f64,
    /// In catalog order.
    pub views: Vec<AggregatedView>,
    pub heatmap: PivotGrid,
}

impl Dashboard {
    pub fn view(&self, name: &str) -> Option<&AggregatedView> {
        self.views.iter().find(|v| v.name == name)
    }

    /// True when the filter left no transactions; every view is then empty.
    pub fn is_empty(&self) -> bool {
        self.fact_rows == 0
    }
}

/// Filters the base table and computes the whole catalog.
///
/// Always starts from `base`, never from a previous result, so a stale
/// in-flight run can simply be dropped when the filter changes.
pub fn run_pipeline(
    base: &FactTable,
    request: &FilterRequest,
    catalog: &ViewCatalog,
) -> Result<Dashboard, EngineError> {
    let started = Instant::now();

    let (applied, table) = engine::filter::filter_resolved(base, request)?;
    let (views, heatmap) = catalog.compute(&table);

    log::info!(
        "computed {} views over {} of {} facts in {:?}",
        views.len() + 1,
        table.len(),
        base.len(),
        started.elapsed()
    );
    if table.is_empty() {
        log::info!("filter {:?} matched no transactions", applied);
    }

    Ok(Dashboard {
        filter: applied,
        fact_rows: table.len(),
        total_sales: table.total_sales(),
        views,
        heatmap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use engine::{build, DateRange, Item, Store, StoreSelection, Transaction};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_table() -> FactTable {
        let stores = vec![Store::new(1, "North"), Store::new(2, "South")];
        let items = vec![Item::new(1, "Soup"), Item::new(2, "Salad")];
        let txs = vec![
            Transaction::new(date(2023, 1, 2), 1, 1, 3.0, 2),
            Transaction::new(date(2023, 7, 4), 2, 2, 5.0, 1),
            Transaction::new(date(2024, 1, 3), 1, 2, 5.0, 4),
            Transaction::new(date(2024, 10, 9), 2, 1, 3.0, 3),
        ];
        build(&txs, &stores, &items).unwrap()
    }

    #[test]
    fn test_standard_catalog_names() {
        let catalog = ViewCatalog::default();
        let names: Vec<&str> = catalog.views().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names.len(), 11);
        assert!(names.contains(&names::TOP_ITEMS_PER_STORE));
        assert_eq!(catalog.heatmap().name, names::WEEKDAY_MONTH_HEATMAP);
    }

    #[test]
    fn test_compute_keeps_catalog_order() {
        let table = create_test_table();
        let catalog = ViewCatalog::default();
        let (views, _) = catalog.compute(&table);
        let computed: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        let declared: Vec<&str> = catalog.views().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(computed, declared);
    }

    #[test]
    fn test_pipeline_applies_filter() {
        let table = create_test_table();
        let request = FilterRequest::new(
            StoreSelection::Named("North".into()),
            DateRange::new(None, Some(date(2023, 12, 31))),
        );
        let dashboard = run_pipeline(&table, &request, &ViewCatalog::default()).unwrap();

        assert_eq!(dashboard.fact_rows, 1);
        assert_eq!(dashboard.total_sales, 6.0);
        assert_eq!(dashboard.filter.start, Some(date(2023, 1, 2)));
        assert_eq!(dashboard.view(names::STORE_SALES).unwrap().len(), 1);
    }

    #[test]
    fn test_pipeline_errors_surface() {
        let table = create_test_table();
        let request =
            FilterRequest::new(StoreSelection::Named("West".into()), DateRange::default());
        assert_eq!(
            run_pipeline(&table, &request, &ViewCatalog::default()).unwrap_err(),
            EngineError::UnknownStore("West".into())
        );
    }

    #[test]
    fn test_empty_selection_gives_empty_views() {
        let table = create_test_table();
        let request = FilterRequest::new(
            StoreSelection::All,
            DateRange::between(date(2023, 3, 1), date(2023, 3, 31)),
        );
        let dashboard = run_pipeline(&table, &request, &ViewCatalog::default()).unwrap();
        assert!(dashboard.is_empty());
        assert!(dashboard.views.iter().all(|v| v.is_empty()));
        assert!(dashboard.heatmap.is_empty());
    }
}
