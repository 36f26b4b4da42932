//! Rollout Event Port
//!
//! Observable progress of a rollout, for streaming per-target lines while a
//! long batch is still running.

use crate::domain::entities::RolloutOutcome;

/// Per-target state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Negotiating,
    Enumerating,
    Mutating,
    Reloading,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Negotiating => "negotiating privileges",
            Phase::Enumerating => "enumerating instances",
            Phase::Mutating => "applying changes",
            Phase::Reloading => "reloading services",
        }
    }
}

/// Event emitted during a rollout
#[derive(Debug)]
pub enum RolloutEvent<'a> {
    TargetStarted {
        index: usize,
        total: usize,
        target: &'a str,
    },
    PhaseEntered {
        target: &'a str,
        phase: Phase,
    },
    TargetFinished {
        index: usize,
        total: usize,
        outcome: &'a RolloutOutcome,
    },
}

/// Receiver of rollout events
pub trait RolloutEventSink {
    fn on_event(&self, event: RolloutEvent<'_>);
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl RolloutEventSink for NoopEventSink {
    fn on_event(&self, _event: RolloutEvent<'_>) {}
}
