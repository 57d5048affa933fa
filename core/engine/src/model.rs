//! FILENAME: core/engine/src/model.rs
//! PURPOSE: Raw record types as they arrive from the operational feed.
//! CONTEXT: One `Transaction` per sale event, plus the two static dimension
//! tables it references. These are plain values; the fact table is derived
//! from them and never writes back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of a store in the `stores` dimension.
pub type StoreId = u32;

/// Identifier of a menu item in the `items` dimension.
pub type ItemId = u32;

/// A single sale event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub store_id: StoreId,
    pub item_id: ItemId,
    /// Unit price of the item.
    pub price: f64,
    /// Number of units sold. Signed so that bad feeds can be rejected
    /// explicitly instead of wrapping.
    pub item_count: i64,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        store_id: StoreId,
        item_id: ItemId,
        price: f64,
        item_count: i64,
    ) -> Self {
        Transaction {
            date,
            store_id,
            item_id,
            price,
            item_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub store_id: StoreId,
    pub store_name: String,
}

impl Store {
    pub fn new(store_id: StoreId, store_name: impl Into<String>) -> Self {
        Store {
            store_id,
            store_name: store_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub item_name: String,
}

impl Item {
    pub fn new(item_id: ItemId, item_name: impl Into<String>) -> Self {
        Item {
            item_id,
            item_name: item_name.into(),
        }
    }
}
