//! FILENAME: core/pivot-engine/src/lib.rs
//! Aggregation subsystem for ServeIQ.
//!
//! This crate turns a filtered fact table (from `engine`) into the grouped,
//! ranked and pivoted views the dashboard renders.
//!
//! Layers:
//! - `definition`: Declarative view configuration (what a view IS)
//! - `cache`: Group keys and accumulators (HOW we reduce)
//! - `view`: Output structures for the renderer (WHAT we hand over)
//! - `engine`: Calculation engine (HOW we calculate)
//! - `catalog`: The dashboard's named views and the pipeline entry point
//! - `profile`: Descriptive statistics of the loaded data

pub mod definition;
pub mod cache;
pub mod view;
pub mod engine;
pub mod catalog;
pub mod profile;

pub use ::engine::EngineError;
pub use definition::*;
pub use cache::{group_key, AggregateAccumulator, DimensionValue, GroupKey, GroupedAggregates};
pub use view::*;
pub use crate::engine::{calculate_pivot, calculate_view, ViewCalculator};
pub use catalog::{
    names, run_pipeline, CatalogOptions, Dashboard, ViewCatalog, DEFAULT_TOP_ITEMS_PER_STORE,
};
pub use profile::{DatasetProfile, NumericSummary};
