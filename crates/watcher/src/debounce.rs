//! Quiet-period debouncing of sheet changes
//!
//! The engine polls the source on a fixed interval and keeps two things in
//! memory: the baseline (always the latest fetch) and at most one pending
//! change. Every fingerprint mismatch replaces the pending change with
//! `(baseline before this fetch, this fetch)` and restarts the quiet period,
//! so by default only the last transition before the sheet goes quiet is
//! reported ([`DiffBase::BurstStart`] keeps the pre-burst grid instead).
//! Once a tick sees no change and the quiet period has elapsed, the pending
//! pair is diffed and, if any column A/B cell moved, sent to the notifier.

use crate::notify::Notifier;
use crate::source::{GridSource, SourceError};
use crate::status::{EngineState, EngineStatus};
use chrono::Utc;
use std::time::Duration;
use sw_core::{diff_rows, fingerprint, Fingerprint, Grid, MessageFormatter, RangeSpec};
use tokio::sync::watch;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Shortest poll interval the run loop will use
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Which baseline a pending change is diffed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffBase {
    /// Baseline just before the most recent mismatch; earlier edits in the
    /// same burst are not reported
    #[default]
    LastTransition,
    /// Baseline before the first mismatch of the burst
    BurstStart,
}

impl std::str::FromStr for DiffBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" | "last-transition" => Ok(DiffBase::LastTransition),
            "burst" | "burst-start" => Ok(DiffBase::BurstStart),
            other => Err(format!("unknown diff base '{other}' (expected 'last' or 'burst')")),
        }
    }
}

/// Timing and diff knobs for the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Time between polls (default: 2s)
    pub poll_interval: Duration,
    /// Time without further changes before a pending change is sent (default: 5s)
    pub quiet_period: Duration,
    /// Extra pause after a failed tick (default: 2s)
    pub error_backoff: Duration,
    /// Baseline used for the reported diff (default: last transition)
    pub diff_base: DiffBase,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            quiet_period: Duration::from_secs(5),
            error_backoff: Duration::from_secs(2),
            diff_base: DiffBase::LastTransition,
        }
    }
}

/// A change waiting for the quiet period to elapse
#[derive(Debug, Clone)]
pub struct PendingChange {
    /// Baseline just before the most recent mismatch (or before the first
    /// one, with [`DiffBase::BurstStart`])
    pub old: Grid,
    /// Grid fetched at the most recent mismatch
    pub new: Grid,
    /// When the most recent mismatch was seen
    pub observed_at: Instant,
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// First successful fetch; stored as baseline, never reported
    BaselineEstablished,
    /// Nothing changed and nothing is pending
    Unchanged,
    /// Fingerprint changed; `superseded` is true if it replaced a pending change
    ChangeBuffered { superseded: bool },
    /// Nothing changed, but the quiet period is still running
    Waiting { remaining: Duration },
    /// Quiet period elapsed and a notification was delivered
    Flushed { rows: usize },
    /// Quiet period elapsed but no column A/B cell differed
    Suppressed,
    /// Quiet period elapsed and delivery failed; the change is dropped
    DeliveryFailed { rows: usize },
}

/// Latest known grid and its fingerprint
#[derive(Debug, Clone)]
struct Baseline {
    grid: Grid,
    fingerprint: Fingerprint,
}

/// Polls a source, debounces changes and hands finished messages to a notifier
pub struct DebounceEngine<S, N> {
    source: S,
    notifier: N,
    formatter: MessageFormatter,
    range: RangeSpec,
    config: EngineConfig,

    /// None until the first successful fetch
    baseline: Option<Baseline>,
    pending: Option<PendingChange>,

    /// Single writer of status snapshots
    status: watch::Sender<EngineStatus>,
}

impl<S, N> DebounceEngine<S, N>
where
    S: GridSource,
    N: Notifier,
{
    /// Create an engine; no fetch happens until the first tick
    pub fn new(
        source: S,
        notifier: N,
        formatter: MessageFormatter,
        range: RangeSpec,
        config: EngineConfig,
    ) -> Self {
        let (status, _) = watch::channel(EngineStatus::default());
        Self {
            source,
            notifier,
            formatter,
            range,
            config,
            baseline: None,
            pending: None,
            status,
        }
    }

    /// Receive a status snapshot after every tick
    pub fn subscribe(&self) -> watch::Receiver<EngineStatus> {
        self.status.subscribe()
    }

    /// Current debounce state
    pub fn state(&self) -> EngineState {
        match (&self.baseline, &self.pending) {
            (None, _) => EngineState::Starting,
            (Some(_), None) => EngineState::Idle,
            (Some(_), Some(_)) => EngineState::Pending,
        }
    }

    /// Latest fetched grid, once known
    pub fn baseline(&self) -> Option<&Grid> {
        self.baseline.as_ref().map(|b| &b.grid)
    }

    /// Buffered change awaiting the quiet period
    pub fn pending(&self) -> Option<&PendingChange> {
        self.pending.as_ref()
    }

    /// Run the poll loop forever
    ///
    /// The first tick runs immediately to establish the baseline. A failed
    /// tick is logged and followed by `error_backoff`; it never ends the loop.
    pub async fn run(mut self) {
        let poll = self.config.poll_interval.max(MIN_POLL_INTERVAL);
        let mut timer = interval(poll);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Watching {} (poll: {:?}, quiet: {:?}, rows: {})",
            self.range,
            poll,
            self.config.quiet_period,
            self.range.expected_rows()
        );

        loop {
            timer.tick().await;

            match self.tick().await {
                Ok(outcome) => debug!("Tick: {:?}", outcome),
                Err(e) => {
                    warn!("Watcher tick failed: {}", e);
                    sleep(self.config.error_backoff).await;
                }
            }
        }
    }

    /// Fetch once and advance the state machine
    ///
    /// On a fetch error the baseline and pending change are left untouched.
    pub async fn tick(&mut self) -> Result<TickOutcome, SourceError> {
        let result = self.poll().await;
        self.publish(&result);
        result
    }

    async fn poll(&mut self) -> Result<TickOutcome, SourceError> {
        let raw = self.source.fetch(&self.range.qualified()).await?;
        let current = Grid::normalize(raw, self.range.expected_rows());
        let current_fp = fingerprint(&current);
        let now = Instant::now();

        let previous = match self.baseline.take() {
            Some(baseline) => baseline,
            None => {
                info!("Baseline established: {} rows, fingerprint {}", current.len(), current_fp.short());
                self.baseline = Some(Baseline {
                    grid: current,
                    fingerprint: current_fp,
                });
                return Ok(TickOutcome::BaselineEstablished);
            }
        };

        if current_fp != previous.fingerprint {
            info!(
                "Change detected ({} -> {}); quiet period restarted",
                previous.fingerprint.short(),
                current_fp.short()
            );
            self.baseline = Some(Baseline {
                grid: current.clone(),
                fingerprint: current_fp,
            });
            let superseded = self.pending.take();
            let old = match (self.config.diff_base, &superseded) {
                (DiffBase::BurstStart, Some(earlier)) => earlier.old.clone(),
                _ => previous.grid,
            };
            self.pending = Some(PendingChange {
                old,
                new: current,
                observed_at: now,
            });
            return Ok(TickOutcome::ChangeBuffered {
                superseded: superseded.is_some(),
            });
        }

        self.baseline = Some(previous);

        let elapsed = match &self.pending {
            Some(pending) => now.saturating_duration_since(pending.observed_at),
            None => return Ok(TickOutcome::Unchanged),
        };
        if elapsed < self.config.quiet_period {
            return Ok(TickOutcome::Waiting {
                remaining: self.config.quiet_period - elapsed,
            });
        }

        // Clear before delivering: a failed send must still end in Idle.
        match self.pending.take() {
            Some(pending) => Ok(self.flush(pending).await),
            None => Ok(TickOutcome::Unchanged),
        }
    }

    /// Diff a pending change and deliver it if anything reportable moved
    async fn flush(&self, pending: PendingChange) -> TickOutcome {
        let rows = pending.old.len().max(pending.new.len());
        let diffs = diff_rows(&pending.old.padded_to(rows), &pending.new.padded_to(rows));

        if diffs.is_empty() {
            info!("Quiet period elapsed; change touched no reported columns");
            return TickOutcome::Suppressed;
        }

        let message = self.formatter.render(&diffs);
        match self.notifier.deliver(&message).await {
            Ok(()) => {
                info!("Sent notification for {} changed rows", diffs.len());
                TickOutcome::Flushed { rows: diffs.len() }
            }
            Err(e) => {
                warn!("Dropping notification for {} changed rows: {}", diffs.len(), e);
                TickOutcome::DeliveryFailed { rows: diffs.len() }
            }
        }
    }

    /// Push a fresh snapshot to status subscribers
    fn publish(&self, result: &Result<TickOutcome, SourceError>) {
        let state = self.state();
        let baseline = self
            .baseline
            .as_ref()
            .map(|b| (b.grid.len(), b.fingerprint.to_hex()));

        self.status.send_modify(|status| {
            status.ticks += 1;
            status.state = state;
            if let Some((rows, fingerprint)) = baseline {
                status.rows = rows;
                status.fingerprint = Some(fingerprint);
            }

            match result {
                Ok(outcome) => {
                    status.consecutive_failures = 0;
                    match outcome {
                        TickOutcome::ChangeBuffered { .. } => {
                            status.last_change_at = Some(Utc::now());
                        }
                        TickOutcome::Flushed { .. } => {
                            status.notifications_sent += 1;
                            status.last_notification_at = Some(Utc::now());
                        }
                        TickOutcome::DeliveryFailed { .. } => {
                            status.delivery_failures += 1;
                        }
                        _ => {}
                    }
                }
                Err(e) => {
                    status.fetch_failures += 1;
                    status.consecutive_failures = status.consecutive_failures.saturating_add(1);
                    status.last_error = Some(e.to_string());
                }
            }
        });
    }
}
