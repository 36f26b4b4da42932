//! Rollout Result
//!
//! The aggregated report of one invocation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::{OutcomeStatus, RolloutOutcome};
use crate::domain::value_objects::Topology;

/// Counts across all targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryTotals {
    pub targets: usize,
    pub ok: usize,
    pub failed: usize,
    pub noop: usize,
    pub skipped: usize,
    /// Instances touched on successful targets
    pub instances_touched: usize,
    /// Instances reloaded on successful targets
    pub reloaded: usize,
}

impl SummaryTotals {
    fn from_outcomes(outcomes: &[RolloutOutcome]) -> Self {
        let mut totals = SummaryTotals {
            targets: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome.status {
                OutcomeStatus::Ok => totals.ok += 1,
                OutcomeStatus::Failed => totals.failed += 1,
                OutcomeStatus::Noop => totals.noop += 1,
                OutcomeStatus::Skipped => totals.skipped += 1,
            }
            if outcome.is_success() {
                totals.instances_touched += outcome.instances_touched;
                totals.reloaded += outcome.reloaded;
            }
        }
        totals
    }
}

/// Result of a rollout across the fleet
#[derive(Debug, Serialize)]
pub struct FleetSummary {
    pub operation: &'static str,
    pub topology: Topology,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_id_source: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub totals: SummaryTotals,
    pub outcomes: Vec<RolloutOutcome>,
}

impl FleetSummary {
    pub fn new(
        operation: &'static str,
        topology: Topology,
        dry_run: bool,
        started_at: DateTime<Utc>,
        outcomes: Vec<RolloutOutcome>,
    ) -> Self {
        Self {
            operation,
            topology,
            dry_run,
            family_id: None,
            family_id_source: None,
            started_at,
            finished_at: Utc::now(),
            totals: SummaryTotals::from_outcomes(&outcomes),
            outcomes,
        }
    }

    pub fn is_success(&self) -> bool {
        self.totals.failed == 0 && self.totals.skipped == 0
    }

    pub fn was_interrupted(&self) -> bool {
        self.totals.skipped > 0
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
