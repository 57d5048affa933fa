//! FILENAME: app/src/main.rs
// PURPOSE: Command-line driver. Loads the three source files, builds the fact
// table once, then emits either the dashboard views or a dataset profile as JSON.

mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;

use config::Config;
use persistence::RawDataset;
use pivot_engine::{run_pipeline, DatasetProfile, ViewCatalog};

#[derive(Debug, Parser)]
#[command(name = "serveiq", version, about = "Restaurant sales dashboard views")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Sales transactions CSV
    #[arg(long)]
    pub transactions: Option<PathBuf>,

    /// Restaurants CSV
    #[arg(long)]
    pub stores: Option<PathBuf>,

    /// Menu items CSV
    #[arg(long)]
    pub items: Option<PathBuf>,

    /// Store name, or "All Restaurants"
    #[arg(short, long)]
    pub store: Option<String>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Items kept per store in the top-items view
    #[arg(long)]
    pub top_items: Option<usize>,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the dataset profile instead of the views
    #[arg(long)]
    pub profile: bool,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    logging::initialize(&config.logging.level)?;

    run(&cli, &config)
}

fn run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let RawDataset {
        transactions,
        stores,
        items,
    } = persistence::load_dataset(&config.data).context("Failed to load source data")?;

    let base = engine::build(&transactions, &stores, &items).context("Failed to build fact table")?;
    tracing::info!(rows = base.len(), stores = base.store_names().len(), "fact table ready");

    if cli.profile {
        let profile = DatasetProfile::compute(&transactions, &stores, &items, &base);
        return emit(&profile, cli.output.as_ref());
    }

    let catalog = ViewCatalog::standard(config.catalog_options());
    let dashboard = run_pipeline(&base, &config.filter_request(), &catalog)
        .context("Failed to compute dashboard")?;

    if dashboard.is_empty() {
        tracing::warn!("no transactions match the selected filter");
    }
    tracing::info!(
        store = ?dashboard.filter.store,
        start = ?dashboard.filter.start,
        end = ?dashboard.filter.end,
        total_sales = dashboard.total_sales,
        "dashboard computed"
    );

    emit(&dashboard, cli.output.as_ref())
}

fn emit<T: Serialize>(value: &T, output: Option<&PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            persistence::save_json(value, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            persistence::write_json(stdout.lock(), value).context("Failed to write output")?;
        }
    }
    Ok(())
}
