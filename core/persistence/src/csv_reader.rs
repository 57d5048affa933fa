// FILENAME: core\persistence\src\csv_reader.rs

use std::collections::HashMap;
use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use engine::{Item, ItemId, Store, StoreId, Transaction};
use serde::Deserialize;

use crate::PersistenceError;

// ============================================================================
// RAW RECORDS
// ============================================================================

// The source files name their key columns `id`/`name`; files that were
// already renamed (e.g. a pre-merged export) use the target names. Both are
// accepted. Unknown columns such as `kcal` or `cost` are ignored.

#[derive(Debug, Deserialize)]
struct StoreRecord {
    #[serde(rename = "id", alias = "store_id")]
    store_id: StoreId,
    #[serde(rename = "name", alias = "store_name")]
    store_name: String,
}

/// A row of the items file. Some exports attach each menu item to the store
/// that sells it; that link is kept so transactions without their own
/// `store_id` column can still be joined.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "id", alias = "item_id")]
    pub item_id: ItemId,
    #[serde(rename = "name", alias = "item_name")]
    pub item_name: String,
    #[serde(default)]
    pub store_id: Option<StoreId>,
}

impl ItemRecord {
    pub fn to_item(&self) -> Item {
        Item::new(self.item_id, self.item_name.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TransactionRecord {
    date: String,
    #[serde(default)]
    store_id: Option<StoreId>,
    item_id: ItemId,
    price: f64,
    item_count: i64,
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).trim(csv::Trim::All);
    builder
}

/// Parses `YYYY-MM-DD`, dropping a trailing time component if present.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let datetime = |format: &str| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|dt| dt.date())
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| datetime("%Y-%m-%d %H:%M:%S"))
        .or_else(|| datetime("%Y-%m-%dT%H:%M:%S"))
}

// ============================================================================
// READERS
// ============================================================================

pub fn read_stores<R: Read>(reader: R) -> Result<Vec<Store>, PersistenceError> {
    let mut csv_reader = reader_builder().from_reader(reader);
    let mut stores = Vec::new();
    for result in csv_reader.deserialize::<StoreRecord>() {
        let record = result?;
        stores.push(Store::new(record.store_id, record.store_name));
    }
    Ok(stores)
}

pub fn read_items<R: Read>(reader: R) -> Result<Vec<ItemRecord>, PersistenceError> {
    let mut csv_reader = reader_builder().from_reader(reader);
    let mut items = Vec::new();
    for result in csv_reader.deserialize::<ItemRecord>() {
        items.push(result?);
    }
    Ok(items)
}

/// Reads transactions. A row without its own `store_id` takes the store its
/// item belongs to; if neither is known the load fails.
pub fn read_transactions<R: Read>(
    reader: R,
    items: &[ItemRecord],
) -> Result<Vec<Transaction>, PersistenceError> {
    let item_stores: HashMap<ItemId, StoreId> = items
        .iter()
        .filter_map(|i| i.store_id.map(|s| (i.item_id, s)))
        .collect();

    let mut csv_reader = reader_builder().from_reader(reader);
    let mut transactions = Vec::new();

    for (index, result) in csv_reader.deserialize::<TransactionRecord>().enumerate() {
        let record = result?;
        let number = index + 1;

        let date = parse_date(&record.date).ok_or_else(|| PersistenceError::InvalidDate {
            record: number,
            value: record.date.clone(),
        })?;
        let store_id = match record.store_id.or_else(|| item_stores.get(&record.item_id).copied()) {
            Some(id) => id,
            None => {
                return Err(PersistenceError::MissingStoreId {
                    record: number,
                    item_id: record.item_id,
                })
            }
        };

        transactions.push(Transaction::new(
            date,
            store_id,
            record.item_id,
            record.price,
            record.item_count,
        ));
    }

    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renames_id_and_name() {
        let stores = read_stores("id,name\n1,Bob's Diner\n2,Corner Cafe\n".as_bytes()).unwrap();
        assert_eq!(stores, vec![Store::new(1, "Bob's Diner"), Store::new(2, "Corner Cafe")]);

        let renamed = read_stores("store_id,store_name\n3,Shack\n".as_bytes()).unwrap();
        assert_eq!(renamed, vec![Store::new(3, "Shack")]);
    }

    #[test]
    fn test_items_ignore_extra_columns() {
        let csv = "id,store_id,name,kcal,cost\n1,4,Chicken Wrap,500,3.5\n2,,Fries,300,1.0\n";
        let items = read_items(csv.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].store_id, Some(4));
        assert_eq!(items[0].to_item(), Item::new(1, "Chicken Wrap"));
        assert_eq!(items[1].store_id, None);
    }

    #[test]
    fn test_transactions_with_store_column() {
        let csv = "date,store_id,item_id,price,item_count\n2019-01-01,1,3,2.5,4\n";
        let txs = read_transactions(csv.as_bytes(), &[]).unwrap();
        assert_eq!(
            txs,
            vec![Transaction::new(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(), 1, 3, 2.5, 4)]
        );
    }

    #[test]
    fn test_store_resolved_through_item() {
        let items = read_items("id,store_id,name\n3,7,Soup\n".as_bytes()).unwrap();
        let csv = ",date,item_id,price,item_count\n0,2019-01-01 00:00:00,3,1.0,2\n";
        let txs = read_transactions(csv.as_bytes(), &items).unwrap();
        assert_eq!(txs[0].store_id, 7);
    }

    #[test]
    fn test_unresolvable_store() {
        let csv = "date,item_id,price,item_count\n2019-01-01,3,1.0,2\n";
        let err = read_transactions(csv.as_bytes(), &[]).unwrap_err();
        assert!(matches!(err, PersistenceError::MissingStoreId { record: 1, item_id: 3 }));
    }

    #[test]
    fn test_malformed_date() {
        let csv = "date,store_id,item_id,price,item_count\n\
                   2019-01-01,1,1,1.0,1\n\
                   01/02/2019,1,1,1.0,1\n";
        let err = read_transactions(csv.as_bytes(), &[]).unwrap_err();
        match err {
            PersistenceError::InvalidDate { record, value } => {
                assert_eq!(record, 2);
                assert_eq!(value, "01/02/2019");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_date_variants() {
        let d = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        assert_eq!(parse_date("2020-02-29"), Some(d));
        assert_eq!(parse_date("2020-02-29 13:45:00"), Some(d));
        assert_eq!(parse_date("2020-02-29T13:45:00"), Some(d));
        assert_eq!(parse_date("2019-02-29"), None);
    }
}
