//! Engine status snapshots
//!
//! The engine publishes a fresh [`EngineStatus`] after every tick through a
//! `tokio::sync::watch` channel. Readers only ever see whole snapshots and
//! never touch the engine itself.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Debounce state as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No baseline yet
    #[default]
    Starting,
    /// Baseline known, nothing pending
    Idle,
    /// A change is buffered and the quiet period is running
    Pending,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    /// Completed ticks, successful or not
    pub ticks: u64,
    pub fetch_failures: u64,
    pub consecutive_failures: u32,
    pub notifications_sent: u64,
    pub delivery_failures: u64,
    /// Row count of the current baseline
    pub rows: usize,
    /// Hex fingerprint of the current baseline
    pub fingerprint: Option<String>,
    pub last_error: Option<String>,
    pub last_change_at: Option<DateTime<Utc>>,
    pub last_notification_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_starting() {
        let status = EngineStatus::default();
        assert_eq!(status.state, EngineState::Starting);
        assert_eq!(status.ticks, 0);
        assert!(status.fingerprint.is_none());
    }

    #[test]
    fn test_status_serializes_state_in_snake_case() {
        let status = EngineStatus {
            state: EngineState::Pending,
            ..EngineStatus::default()
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["state"], "pending");
        assert_eq!(value["notifications_sent"], 0);
        assert!(value["last_error"].is_null());
    }
}
