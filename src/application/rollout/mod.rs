//! Rollout Module
//!
//! Runs one fleet operation across every target.
//!
//! ## Structure
//!
//! - `options` - `Operation` and the per-invocation `RolloutContext`
//! - `planner` - pure per-host planning (`plan_host`)
//! - `status` - read-only status and fingerprint reports
//! - `result` - `FleetSummary`
//! - `use_case` - the executor (`RolloutUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use relayctl::application::rollout::{Operation, RolloutContext, RolloutHost, RolloutUseCase};
//!
//! let use_case = RolloutUseCase::new(Box::new(deriver)).with_events(sink);
//! let summary = use_case.execute(&ctx, Operation::Status, None, &hosts)?;
//! ```

mod options;
mod planner;
mod result;
mod status;
mod use_case;

pub use options::{Operation, RolloutContext};
pub use planner::{directive_edits, plan_host, HostPlan, PlanInputs};
pub use result::{FleetSummary, SummaryTotals};
pub use status::{collect_fingerprints, host_status};
pub use use_case::{RolloutHost, RolloutUseCase};
