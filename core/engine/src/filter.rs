//! FILENAME: core/engine/src/filter.rs
//! PURPOSE: Restricts a fact table to one store and/or a closed date range.
//! CONTEXT: Filter state is an explicit value passed into the pipeline. Each
//! filter change re-applies it to the immutable base table, so previous
//! snapshots stay valid for any computation still holding them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::fact::FactTable;

/// Sentinel store name meaning "do not filter by store".
pub const ALL_RESTAURANTS: &str = "All Restaurants";

// ============================================================================
// FILTER REQUEST
// ============================================================================

/// Which store(s) to keep.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StoreSelection {
    #[default]
    All,
    Named(String),
}

impl StoreSelection {
    /// Interprets a UI selection: unset or "All Restaurants" selects everything.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            None => StoreSelection::All,
            Some(n) if n == ALL_RESTAURANTS => StoreSelection::All,
            Some(n) => StoreSelection::Named(n.to_string()),
        }
    }

    /// Folds a `Named` sentinel into `All`, however the selection was built.
    pub fn normalized(&self) -> Self {
        match self {
            StoreSelection::Named(n) if n == ALL_RESTAURANTS => StoreSelection::All,
            other => other.clone(),
        }
    }
}

/// Closed date range; either bound may be left open and then defaults to the
/// table's earliest/latest date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange {
            start: Some(start),
            end: Some(end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterRequest {
    pub store: StoreSelection,
    pub date_range: DateRange,
}

impl FilterRequest {
    pub fn new(store: StoreSelection, date_range: DateRange) -> Self {
        FilterRequest { store, date_range }
    }
}

/// The bounds a filter actually applied, after defaults were resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFilter {
    pub store: StoreSelection,
    /// `None` only when the base table is empty and no bound was given.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

// ============================================================================
// FILTER ENGINE
// ============================================================================

/// Resolves default bounds and validates the request against the table.
pub fn resolve(table: &FactTable, request: &FilterRequest) -> Result<AppliedFilter, EngineError> {
    let store = request.store.normalized();
    if let StoreSelection::Named(name) = &store {
        if !table.has_store(name) {
            return Err(EngineError::UnknownStore(name.clone()));
        }
    }

    let bounds = table.date_bounds();
    let start = request.date_range.start.or(bounds.map(|(lo, _)| lo));
    let end = request.date_range.end.or(bounds.map(|(_, hi)| hi));

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(EngineError::InvalidRange { start, end });
        }
    }

    Ok(AppliedFilter {
        store,
        start,
        end,
    })
}

/// Returns the subset of `table` matching `request`. Both date bounds are
/// inclusive.
pub fn filter(table: &FactTable, request: &FilterRequest) -> Result<FactTable, EngineError> {
    filter_resolved(table, request).map(|(_, subset)| subset)
}

/// Like [`filter`], but also returns the bounds that were applied.
pub fn filter_resolved(
    table: &FactTable,
    request: &FilterRequest,
) -> Result<(AppliedFilter, FactTable), EngineError> {
    let applied = resolve(table, request)?;
    let subset = apply(table, &applied);
    Ok((applied, subset))
}

/// Applies bounds produced by `resolve`.
pub(crate) fn apply(table: &FactTable, applied: &AppliedFilter) -> FactTable {
    let store_name = match &applied.store {
        StoreSelection::All => None,
        StoreSelection::Named(name) => Some(name.as_str()),
    };

    let rows = table
        .rows()
        .iter()
        .filter(|row| applied.start.map_or(true, |s| row.date >= s))
        .filter(|row| applied.end.map_or(true, |e| row.date <= e))
        .filter(|row| match store_name {
            None => true,
            Some(name) => row.store_name.as_deref() == Some(name),
        })
        .cloned()
        .collect::<Vec<_>>();

    log::debug!(
        "filter {:?} {:?}..={:?}: {} of {} rows kept",
        applied.store,
        applied.start,
        applied.end,
        rows.len(),
        table.len()
    );

    table.with_rows(rows)
}
