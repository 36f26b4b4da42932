//! JSON Event Sink
//!
//! Outputs rollout events as NDJSON for CI/automation consumption.

use crate::domain::ports::{RolloutEvent, RolloutEventSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a JSON event sink writing to a custom writer
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

impl RolloutEventSink for JsonEventSink {
    fn on_event(&self, event: RolloutEvent<'_>) {
        let json = match event {
            RolloutEvent::TargetStarted {
                index,
                total,
                target,
            } => serde_json::json!({
                "event": "target_start",
                "index": index,
                "total": total,
                "target": target,
            }),

            RolloutEvent::PhaseEntered { target, phase } => serde_json::json!({
                "event": "phase",
                "target": target,
                "phase": phase.as_str(),
            }),

            RolloutEvent::TargetFinished {
                index,
                total,
                outcome,
            } => serde_json::json!({
                "event": "target_finished",
                "index": index,
                "total": total,
                "outcome": outcome,
            }),
        };

        self.write_event(json);
    }
}
