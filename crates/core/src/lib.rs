//! Sheetwatch Core - pure data layer for the sheet change watcher
//!
//! This crate provides everything that does not touch the network:
//! - Range descriptors and expected row counts
//! - Fixed-width grid snapshots and normalization
//! - BLAKE3 grid fingerprints
//! - Row diffing over columns A and B
//! - Notification message rendering

pub mod diff;
pub mod error;
pub mod format;
pub mod grid;
pub mod hash;
pub mod range;

// Re-export main types for convenience
pub use diff::{diff_rows, RowDiff};
pub use error::CoreError;
pub use format::{Locale, MessageFormatter};
pub use grid::{Grid, Row, COLUMNS};
pub use hash::{fingerprint, Fingerprint};
pub use range::{RangeSpec, DEFAULT_ROWS, MAX_ROWS};

/// Common result type used throughout sheetwatch-core
pub type Result<T> = std::result::Result<T, CoreError>;
