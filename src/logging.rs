use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub const LOG_FILTER_ENV: &str = "JW_LOG";

fn filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Sends all `tracing` output to `log_path` (appending, no colour codes).
/// A subscriber that is already installed is left in place.
pub fn init_file_logging(log_path: &Path, debug: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false);

    if tracing_subscriber::registry()
        .with(filter(debug))
        .with(file_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing already initialised; {} not attached", log_path.display());
    }
    Ok(())
}

/// First lines of every run log.
pub fn log_run_header(command: &str, dry_run: bool) {
    tracing::info!(
        "jisc-wrangler {} ({}) build {}",
        env!("CARGO_PKG_VERSION"),
        command,
        env!("BUILD_UUID")
    );
    if dry_run {
        tracing::info!("Executing in DRY-RUN mode: no output files will be written");
    }
    for key in crate::config::unknown_env_keys() {
        tracing::warn!("Ignoring unknown environment variable {}", key);
    }
}
