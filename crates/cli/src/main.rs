//! Sheetwatch CLI - sheetwatch command

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli_lib::config::Settings;
use cli_lib::logging;
use tracing::{debug, warn};

mod cmd;
mod daemon;

/// Sheetwatch - Google Sheet change notifications for Discord
#[derive(Parser)]
#[command(name = "sheetwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the sheet and post debounced changes (default)
    Run,
    /// Fetch the range once and print what the watcher sees
    Probe {
        /// Number of non-empty rows to show (default: 10)
        #[arg(long, default_value = "10")]
        rows: usize,
    },
    /// Print the message the current contents would produce, without sending
    Preview,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads the environment
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = logging::init(cli.settings.log_dir.as_deref())?;

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env: {}", e),
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd::run::run(&cli.settings).await,
        Commands::Probe { rows } => cmd::probe::run(&cli.settings, rows).await,
        Commands::Preview => cmd::preview::run(&cli.settings).await,
    }
}
