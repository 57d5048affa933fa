//! FILENAME: core/engine/src/fact.rs
//! PURPOSE: Builds the fact table by joining transactions to their dimensions.
//! CONTEXT: The join is a LEFT join. Raw feeds can reference stores or items
//! whose dimension rows have not propagated yet, so a dangling reference keeps
//! its transaction with an absent name instead of dropping it. Measures are
//! validated here; nothing downstream ever sees a negative `total_sales`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::calendar::CalendarFields;
use crate::error::EngineError;
use crate::model::{Item, ItemId, Store, StoreId, Transaction};

// ============================================================================
// FACT ROW
// ============================================================================

/// A transaction enriched with dimension names, the sales measure and its
/// calendar attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    pub date: NaiveDate,
    pub store_id: StoreId,
    pub item_id: ItemId,
    pub price: f64,
    pub item_count: u64,
    /// `price * item_count`
    pub total_sales: f64,
    /// `None` when `store_id` has no row in the stores dimension.
    pub store_name: Option<Arc<str>>,
    /// `None` when `item_id` has no row in the items dimension.
    pub item_name: Option<Arc<str>>,
    pub calendar: CalendarFields,
}

// ============================================================================
// FACT TABLE
// ============================================================================

/// Immutable, cheaply clonable fact table.
///
/// Rows and the store dimension are shared behind `Arc`s so that filtered
/// snapshots and parallel view computations never copy or mutate the base.
#[derive(Debug, Clone)]
pub struct FactTable {
    rows: Arc<[FactRow]>,
    /// Every name in the stores dimension, sorted and deduplicated. Kept even
    /// for stores with no transactions so filters validate against the
    /// dimension rather than against what happens to be loaded.
    store_names: Arc<[Arc<str>]>,
}

impl FactTable {
    pub(crate) fn from_parts(rows: Vec<FactRow>, store_names: Arc<[Arc<str>]>) -> Self {
        FactTable {
            rows: rows.into(),
            store_names,
        }
    }

    /// Builds a new table over a subset of rows, sharing the store dimension.
    pub(crate) fn with_rows(&self, rows: Vec<FactRow>) -> Self {
        FactTable {
            rows: rows.into(),
            store_names: Arc::clone(&self.store_names),
        }
    }

    pub fn rows(&self) -> &[FactRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Store names known to the stores dimension, in lexical order.
    pub fn store_names(&self) -> &[Arc<str>] {
        &self.store_names
    }

    pub fn has_store(&self, name: &str) -> bool {
        self.store_names
            .binary_search_by(|probe| probe.as_ref().cmp(name))
            .is_ok()
    }

    /// Earliest and latest transaction date, or `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut iter = self.rows.iter().map(|r| r.date);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Sum of `total_sales` over every row.
    pub fn total_sales(&self) -> f64 {
        self.rows.iter().map(|r| r.total_sales).sum()
    }

    /// Number of rows whose store reference did not resolve.
    pub fn unmatched_store_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.store_name.is_none()).count()
    }

    /// Number of rows whose item reference did not resolve.
    pub fn unmatched_item_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.item_name.is_none()).count()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Joins transactions to stores and items and derives `total_sales` and the
/// calendar fields.
///
/// Fails on a negative (or non-finite) measure and on duplicate dimension
/// ids. Dangling references are kept with absent names and logged once per
/// distinct id.
pub fn build(
    transactions: &[Transaction],
    stores: &[Store],
    items: &[Item],
) -> Result<FactTable, EngineError> {
    let store_index = index_dimension(
        "store",
        stores.iter().map(|s| (s.store_id, s.store_name.as_str())),
    )?;
    let item_index = index_dimension(
        "item",
        items.iter().map(|i| (i.item_id, i.item_name.as_str())),
    )?;

    let mut dangling_stores: BTreeSet<StoreId> = BTreeSet::new();
    let mut dangling_items: BTreeSet<ItemId> = BTreeSet::new();
    let mut rows = Vec::with_capacity(transactions.len());

    for (row, tx) in transactions.iter().enumerate() {
        if !tx.price.is_finite() || tx.price < 0.0 {
            return Err(EngineError::Validation {
                row,
                field: "price",
                value: tx.price,
            });
        }
        let item_count = u64::try_from(tx.item_count).map_err(|_| EngineError::Validation {
            row,
            field: "item_count",
            value: tx.item_count as f64,
        })?;

        let store_name = store_index.get(&tx.store_id).cloned();
        if store_name.is_none() {
            dangling_stores.insert(tx.store_id);
        }
        let item_name = item_index.get(&tx.item_id).cloned();
        if item_name.is_none() {
            dangling_items.insert(tx.item_id);
        }

        rows.push(FactRow {
            date: tx.date,
            store_id: tx.store_id,
            item_id: tx.item_id,
            price: tx.price,
            item_count,
            total_sales: tx.price * item_count as f64,
            store_name,
            item_name,
            calendar: CalendarFields::derive(tx.date),
        });
    }

    for id in &dangling_stores {
        log::warn!(
            "transactions reference unknown store_id {}; keeping rows with no store name",
            id
        );
    }
    for id in &dangling_items {
        log::warn!("transactions reference unknown item_id {}; keeping rows with no item name", id);
    }

    let mut store_names: Vec<Arc<str>> = store_index.into_values().collect();
    store_names.sort();
    store_names.dedup();

    log::debug!(
        "built fact table: {} rows, {} stores, {} items",
        rows.len(),
        stores.len(),
        items.len()
    );

    Ok(FactTable::from_parts(rows, store_names.into()))
}

/// Indexes a dimension table by id, rejecting duplicate ids.
fn index_dimension<'a>(
    table: &'static str,
    entries: impl Iterator<Item = (u32, &'a str)>,
) -> Result<HashMap<u32, Arc<str>>, EngineError> {
    let mut index = HashMap::new();
    for (id, name) in entries {
        if index.insert(id, Arc::<str>::from(name)).is_some() {
            return Err(EngineError::DuplicateDimensionKey { table, id });
        }
    }
    Ok(index)
}
