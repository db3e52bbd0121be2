//! Fetch the watched range once and show what the watcher would see

use anyhow::{Context, Result};
use cli_lib::config::Settings;
use owo_colors::OwoColorize;
use sw_core::fingerprint;

pub async fn run(settings: &Settings, limit: usize) -> Result<()> {
    let config = settings.source_config().context("Invalid configuration")?;
    let grid = super::fetch_grid(&config).await?;
    let fp = fingerprint(&grid);

    let non_empty: Vec<(usize, &[String; 3])> = grid
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|(i, row)| (i + 1, row))
        .collect();

    println!("{}", "Sheet Probe".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("Range:         {}", config.range.to_string().cyan());
    println!("Rows:          {}", grid.len());
    println!("Non-empty:     {}", non_empty.len());
    println!("Fingerprint:   {}", fp.short().yellow());
    println!();

    if non_empty.is_empty() {
        println!("{}", "No data in range".dimmed());
        return Ok(());
    }

    for (row, cells) in non_empty.iter().take(limit) {
        println!(
            "  {:>4}  {}  {}  {}",
            row.to_string().dimmed(),
            cells[0],
            cells[1].green(),
            cells[2].dimmed()
        );
    }
    if non_empty.len() > limit {
        println!("  {}", format!("... {} more rows", non_empty.len() - limit).dimmed());
    }

    Ok(())
}
