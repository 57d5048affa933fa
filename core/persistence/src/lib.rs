//! FILENAME: core/persistence/src/lib.rs
//! ServeIQ Persistence Module
//!
//! Thin adapter between files and the engine: loads the three raw CSV record
//! sets (renaming their `id`/`name` columns) and writes computed views as JSON.

mod csv_reader;
mod error;
mod json_writer;

pub use csv_reader::{parse_date, read_items, read_stores, read_transactions, ItemRecord};
pub use error::PersistenceError;
pub use json_writer::{save_json, write_json};

use engine::{Item, Store, Transaction};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

// ============================================================================
// DATA PATHS
// ============================================================================

/// Locations of the three source files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub transactions: PathBuf,
    pub stores: PathBuf,
    pub items: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            transactions: PathBuf::from("sales.csv"),
            stores: PathBuf::from("restaurants.csv"),
            items: PathBuf::from("items.csv"),
        }
    }
}

// ============================================================================
// RAW DATASET
// ============================================================================

/// The three raw record sets, exactly as loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    pub transactions: Vec<Transaction>,
    pub stores: Vec<Store>,
    pub items: Vec<Item>,
}

/// Reads a dataset from three already-open sources.
pub fn read_dataset<T, S, I>(
    transactions: T,
    stores: S,
    items: I,
) -> Result<RawDataset, PersistenceError>
where
    T: std::io::Read,
    S: std::io::Read,
    I: std::io::Read,
{
    let stores = read_stores(stores)?;
    let item_records = read_items(items)?;
    let transactions = read_transactions(transactions, &item_records)?;

    log::info!(
        "loaded {} transactions, {} stores, {} items",
        transactions.len(),
        stores.len(),
        item_records.len()
    );

    Ok(RawDataset {
        transactions,
        stores,
        items: item_records.iter().map(ItemRecord::to_item).collect(),
    })
}

fn open(path: &Path) -> Result<BufReader<File>, PersistenceError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| PersistenceError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Opens and reads the three files named by `paths`.
pub fn load_dataset(paths: &DataPaths) -> Result<RawDataset, PersistenceError> {
    log::debug!(
        "loading transactions={} stores={} items={}",
        paths.transactions.display(),
        paths.stores.display(),
        paths.items.display()
    );
    read_dataset(open(&paths.transactions)?, open(&paths.stores)?, open(&paths.items)?)
}
