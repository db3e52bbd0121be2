//! Render the notification the current sheet contents would produce

use anyhow::{Context, Result};
use cli_lib::config::Settings;
use owo_colors::OwoColorize;
use sw_core::{diff_rows, Grid, MessageFormatter};

/// Diff the live range against an empty sheet and print the message
///
/// Nothing is sent; this is for checking wording and layout.
pub async fn run(settings: &Settings) -> Result<()> {
    let config = settings.source_config().context("Invalid configuration")?;
    let current = super::fetch_grid(&config).await?;
    let empty = Grid::normalize(Vec::new(), current.len());

    let diffs = diff_rows(&empty, &current);
    if diffs.is_empty() {
        println!("{}", "Columns A and B are empty; nothing would be sent".dimmed());
        return Ok(());
    }

    let formatter = MessageFormatter::new(config.range.sheet(), &config.spreadsheet_id, settings.locale);
    println!("{}", format!("Preview ({} rows, not sent)", diffs.len()).bold());
    println!();
    println!("{}", formatter.render(&diffs));

    Ok(())
}
