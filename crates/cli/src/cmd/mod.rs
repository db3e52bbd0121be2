//! CLI command implementations

pub mod preview;
pub mod probe;
pub mod run;

use anyhow::{Context, Result};
use cli_lib::config::SourceConfig;
use sw_core::Grid;
use watcher::{GridSource, SheetsClient};

/// Fetch the configured range once and normalize it
pub(crate) async fn fetch_grid(config: &SourceConfig) -> Result<Grid> {
    let client = SheetsClient::new(&config.spreadsheet_id, config.auth.clone(), config.fetch_timeout)
        .context("Failed to build Sheets client")?;
    let raw = client
        .fetch(&config.range.qualified())
        .await
        .with_context(|| format!("Failed to fetch {}", config.range))?;
    Ok(Grid::normalize(raw, config.range.expected_rows()))
}
