//! FILENAME: app/src/logging.rs
// PURPOSE: Logging setup for the command-line driver.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Writes to stderr so stdout stays clean for
/// JSON output. `RUST_LOG` takes precedence over the configured level.
pub fn initialize(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Cannot initialize logging: {}", e))?;

    tracing::debug!("logging initialized at level {}", level);
    Ok(())
}
