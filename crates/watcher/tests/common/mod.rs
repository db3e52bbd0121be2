//! Common utilities for engine tests

pub mod doubles;
pub mod fixtures;

// Re-export commonly used items
pub use doubles::{RecordingNotifier, ScriptedSource};
pub use fixtures::{engine, engine_with, rows};
