//! Watcher daemon lifecycle
//!
//! Wires the Sheets client, webhook notifier and debounce engine together,
//! binds the health endpoint and runs both until a shutdown signal arrives.

use anyhow::{anyhow, Context, Result};
use cli_lib::config::WatchConfig;
use cli_lib::health::HealthServer;
use sw_core::MessageFormatter;
use tracing::{info, warn};
use watcher::{DebounceEngine, SheetsClient, WebhookNotifier};

/// Run the watcher in the foreground until SIGINT/SIGTERM
pub async fn run(config: WatchConfig) -> Result<()> {
    let source = &config.source;
    let client = SheetsClient::new(&source.spreadsheet_id, source.auth.clone(), source.fetch_timeout)
        .context("Failed to build Sheets client")?;
    let notifier = WebhookNotifier::new(&config.webhook_url, config.notify_timeout)
        .context("Failed to build webhook notifier")?;
    let formatter = MessageFormatter::new(source.range.sheet(), &source.spreadsheet_id, config.locale);

    let engine = DebounceEngine::new(
        client,
        notifier,
        formatter,
        source.range.clone(),
        config.engine.clone(),
    );
    let status = engine.subscribe();

    // Bind before polling starts so a taken port fails the process
    let server = HealthServer::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind health endpoint on {}", config.listen))?;

    info!(
        "Sheetwatch started (spreadsheet: {}, range: {}, locale: {:?})",
        source.spreadsheet_id, source.range, config.locale
    );

    let mut engine_task = tokio::spawn(engine.run());
    let mut health_task = tokio::spawn(server.serve(status));

    let result = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping");
            Ok(())
        }
        joined = &mut engine_task => match joined {
            Ok(()) => Err(anyhow!("Watcher loop exited unexpectedly")),
            Err(e) => Err(e).context("Watcher task panicked"),
        },
        joined = &mut health_task => match joined {
            Ok(()) => Err(anyhow!("Health endpoint exited unexpectedly")),
            Err(e) => Err(e).context("Health endpoint task panicked"),
        },
    };

    engine_task.abort();
    health_task.abort();
    result
}

/// Resolve on Ctrl-C, or SIGTERM on unix (what hosting platforms send)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
