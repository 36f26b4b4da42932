//! Reload orchestration
//!
//! Only instances that were both touched and running are reloaded, with one
//! batched service manager call. A failed reload falls back to a restart of
//! the same set.

use crate::domain::ports::{Elevation, HostShell, ServiceAction};
use crate::error::{RolloutError, RolloutResult};

/// Actions tried in order until one succeeds
pub const RELOAD_STRATEGIES: [ServiceAction; 2] = [ServiceAction::Reload, ServiceAction::Restart];

/// What the orchestrator did on one host
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReloadReport {
    /// Touched units that were active
    pub units: Vec<String>,
    /// The action that succeeded, `None` when nothing was running
    pub action: Option<ServiceAction>,
}

/// Reload the active subset of `touched` units.
pub fn reload_touched(
    shell: &dyn HostShell,
    elevation: Elevation,
    touched: &[String],
) -> RolloutResult<ReloadReport> {
    if touched.is_empty() {
        return Ok(ReloadReport::default());
    }

    let units = shell.active_units(elevation, touched)?;
    if units.is_empty() {
        tracing::debug!(host = %shell.label(), "no touched instance is running, nothing to reload");
        return Ok(ReloadReport::default());
    }

    for action in RELOAD_STRATEGIES {
        if shell.service_action(elevation, action, &units)? {
            tracing::debug!(host = %shell.label(), action = action.as_str(), count = units.len(), "services reloaded");
            return Ok(ReloadReport {
                units,
                action: Some(action),
            });
        }
        tracing::warn!(host = %shell.label(), action = action.as_str(), "service action failed");
    }

    Err(RolloutError::ReloadFailed {
        target: shell.label(),
        message: format!("reload and restart both failed for {}", units.join(" ")),
    })
}
