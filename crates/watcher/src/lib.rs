//! Sheet change watching for Sheetwatch
//!
//! This crate provides the polling side of the watcher:
//! - The debounce engine (baseline, pending change, quiet period)
//! - Source client trait and the Google Sheets values API client
//! - Notifier trait and the webhook notifier
//! - Engine status snapshots for the health endpoint

pub mod debounce;
pub mod notify;
pub mod source;
pub mod status;

pub use debounce::{DebounceEngine, DiffBase, EngineConfig, PendingChange, TickOutcome};
pub use notify::{Notifier, NotifyError, WebhookNotifier};
pub use source::{GridSource, SheetsAuth, SheetsClient, SourceError};
pub use status::{EngineState, EngineStatus};
