//! FILENAME: core/persistence/src/error.rs

use std::path::PathBuf;

use engine::ItemId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date at record {record}: {value:?}")]
    InvalidDate { record: usize, value: String },

    #[error("Record {record} has no store_id and item {item_id} does not name a store")]
    MissingStoreId { record: usize, item_id: ItemId },
}
