//! In-memory source and notifier doubles
//!
//! Both are cheap handles over shared state, so a test can keep one copy
//! while the engine owns the other.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use watcher::{GridSource, Notifier, NotifyError, SourceError};

type Rows = Vec<Vec<String>>;

#[derive(Default)]
struct Script {
    steps: VecDeque<Result<Rows, u16>>,
    last: Rows,
    ranges: Vec<String>,
}

/// Source that replays queued responses, then repeats the last good grid
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful fetch
    pub fn push(&self, rows: Rows) -> &Self {
        self.script.lock().steps.push_back(Ok(rows));
        self
    }

    /// Queue a failed fetch with the given HTTP status
    pub fn push_error(&self, status: u16) -> &Self {
        self.script.lock().steps.push_back(Err(status));
        self
    }

    /// Number of fetches served so far
    pub fn fetches(&self) -> usize {
        self.script.lock().ranges.len()
    }

    /// Ranges requested so far
    pub fn ranges(&self) -> Vec<String> {
        self.script.lock().ranges.clone()
    }
}

#[async_trait]
impl GridSource for ScriptedSource {
    async fn fetch(&self, range: &str) -> Result<Rows, SourceError> {
        let mut script = self.script.lock();
        script.ranges.push(range.to_string());

        match script.steps.pop_front() {
            Some(Ok(rows)) => {
                script.last = rows.clone();
                Ok(rows)
            }
            Some(Err(status)) => Err(SourceError::Status {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(script.last.clone()),
        }
    }
}

#[derive(Default)]
struct Outbox {
    delivered: Vec<String>,
    attempts: usize,
    failures_left: usize,
}

/// Notifier that records messages and can be told to fail
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    outbox: Arc<Mutex<Outbox>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` deliveries
    pub fn fail_next(&self, count: usize) {
        self.outbox.lock().failures_left = count;
    }

    /// Successfully delivered messages, oldest first
    pub fn delivered(&self) -> Vec<String> {
        self.outbox.lock().delivered.clone()
    }

    /// Delivery attempts, including failed ones
    pub fn attempts(&self) -> usize {
        self.outbox.lock().attempts
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        let mut outbox = self.outbox.lock();
        outbox.attempts += 1;

        if outbox.failures_left > 0 {
            outbox.failures_left -= 1;
            return Err(NotifyError::Rejected {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }

        outbox.delivered.push(text.to_string());
        Ok(())
    }
}
