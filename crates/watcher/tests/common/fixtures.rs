//! Engine and grid fixtures

use super::doubles::{RecordingNotifier, ScriptedSource};
use std::time::Duration;
use sw_core::{Locale, MessageFormatter, RangeSpec};
use watcher::{DebounceEngine, EngineConfig};

pub type TestEngine = DebounceEngine<ScriptedSource, RecordingNotifier>;

/// Build raw source rows from string triples
pub fn rows(cells: &[[&str; 3]]) -> Vec<Vec<String>> {
    cells
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

/// Engine over `Sheet1!A1:C3` with a 5s quiet period and English messages
pub fn engine(source: &ScriptedSource, notifier: &RecordingNotifier) -> TestEngine {
    engine_with(source, notifier, EngineConfig::default())
}

pub fn engine_with(
    source: &ScriptedSource,
    notifier: &RecordingNotifier,
    config: EngineConfig,
) -> TestEngine {
    let range = RangeSpec::parse("Sheet1", "A1:C3").expect("valid range");
    let formatter = MessageFormatter::new("Sheet1", "sheet-id", Locale::En);
    DebounceEngine::new(
        source.clone(),
        notifier.clone(),
        formatter,
        range,
        EngineConfig {
            quiet_period: Duration::from_secs(5),
            ..config
        },
    )
}
