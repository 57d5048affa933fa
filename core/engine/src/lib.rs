//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the sales fact engine.
//! CONTEXT: Raw records -> fact table (join + measure + calendar) -> filtered
//! snapshot. Aggregation over the snapshot lives in `pivot-engine`.

pub mod calendar;
pub mod error;
pub mod fact;
pub mod filter;
pub mod model;

// Re-export commonly used types at the crate root
pub use calendar::{CalendarFields, DayOfWeek, Month};
pub use error::EngineError;
pub use fact::{build, FactRow, FactTable};
pub use filter::{
    filter, filter_resolved, AppliedFilter, DateRange, FilterRequest, StoreSelection,
    ALL_RESTAURANTS,
};
pub use model::{Item, ItemId, Store, StoreId, Transaction};
