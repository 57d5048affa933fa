//! FILENAME: core/engine/src/error.rs

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A transaction carries a measure that cannot produce a valid `total_sales`.
    #[error("Invalid transaction at row {row}: {field} = {value}")]
    Validation {
        row: usize,
        field: &'static str,
        value: f64,
    },

    #[error("Duplicate {table} id {id}: dimension keys must be unique")]
    DuplicateDimensionKey { table: &'static str, id: u32 },

    #[error("Unknown store: {0}")]
    UnknownStore(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}
