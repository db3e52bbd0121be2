//! Run the watcher daemon

use crate::daemon;
use anyhow::{Context, Result};
use cli_lib::config::Settings;

pub async fn run(settings: &Settings) -> Result<()> {
    let config = settings.watch_config().context("Invalid configuration")?;
    daemon::run(config).await
}
