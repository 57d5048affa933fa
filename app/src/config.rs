//! FILENAME: app/src/config.rs
// PURPOSE: TOML configuration for a dashboard run.
// CONTEXT: Every section is optional. Command-line flags override whatever the
// file says; see `Config::apply_cli`.

use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;

use engine::{DateRange, FilterRequest, StoreSelection};
use persistence::DataPaths;
use pivot_engine::{CatalogOptions, DEFAULT_TOP_ITEMS_PER_STORE};

use crate::Cli;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataPaths,
    pub filter: FilterConfig,
    pub views: ViewsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// A store name, or "All Restaurants".
    pub store: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    pub top_items_per_store: usize,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        ViewsConfig {
            top_items_per_store: DEFAULT_TOP_ITEMS_PER_STORE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    /// Reads `path`, or returns the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("In config file {}", path.display()))
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(p) = &cli.transactions {
            self.data.transactions = p.clone();
        }
        if let Some(p) = &cli.stores {
            self.data.stores = p.clone();
        }
        if let Some(p) = &cli.items {
            self.data.items = p.clone();
        }
        if let Some(store) = &cli.store {
            self.filter.store = Some(store.clone());
        }
        if cli.start.is_some() {
            self.filter.start = cli.start;
        }
        if cli.end.is_some() {
            self.filter.end = cli.end;
        }
        if let Some(n) = cli.top_items {
            self.views.top_items_per_store = n;
        }
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
    }

    pub fn filter_request(&self) -> FilterRequest {
        FilterRequest::new(
            StoreSelection::from_name(self.filter.store.as_deref()),
            DateRange::new(self.filter.start, self.filter.end),
        )
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            top_items_per_store: self.views.top_items_per_store,
        }
    }
}
