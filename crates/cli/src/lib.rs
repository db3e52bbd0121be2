//! Sheetwatch CLI internals
//!
//! Shared by the `sheetwatch` binary and its integration tests.

pub mod config;
pub mod health;
pub mod logging;
