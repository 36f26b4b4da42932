//! Console event sink
//!
//! Streams one block per finished target to stdout while the batch is still
//! running. Progress (target start, phases) goes to stderr and only shows up
//! with `-v`.

use std::io::{self, Write};
use std::sync::Mutex;

use crate::domain::ports::{RolloutEvent, RolloutEventSink};

use super::output::{render_outcome, TextStyle};

pub struct ConsoleEventSink {
    style: TextStyle,
    out: Mutex<Box<dyn Write + Send>>,
    progress: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleEventSink {
    pub fn new(style: TextStyle) -> Self {
        Self::with_writers(style, io::stdout(), io::stderr())
    }

    pub fn with_writers<O, P>(style: TextStyle, out: O, progress: P) -> Self
    where
        O: Write + Send + 'static,
        P: Write + Send + 'static,
    {
        Self {
            style,
            out: Mutex::new(Box::new(out)),
            progress: Mutex::new(Box::new(progress)),
        }
    }

    fn progress(&self, line: String) {
        if self.style.verbose == 0 {
            return;
        }
        if let Ok(mut writer) = self.progress.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

impl RolloutEventSink for ConsoleEventSink {
    fn on_event(&self, event: RolloutEvent<'_>) {
        match event {
            RolloutEvent::TargetStarted {
                index,
                total,
                target,
            } => self.progress(format!("[{}/{}] {}", index + 1, total, target)),
            RolloutEvent::PhaseEntered { target, phase } => {
                self.progress(format!("  {}: {}", target, phase.as_str()))
            }
            RolloutEvent::TargetFinished { outcome, .. } => {
                if let Ok(mut writer) = self.out.lock() {
                    let _ = write!(writer, "{}", render_outcome(outcome, &self.style));
                    let _ = writer.flush();
                }
            }
        }
    }
}
