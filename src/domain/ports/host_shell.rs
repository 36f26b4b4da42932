//! HostShell port - typed procedures executed on one fleet host
//!
//! Every operation a rollout performs on a host goes through this trait, so
//! the domain never builds command text itself. Implementations:
//! - `ScriptShell<LocalTransport>` - this machine via `sh`
//! - `ScriptShell<SshTransport>` - a remote machine via `ssh`
//! - in-memory doubles in tests

use std::path::PathBuf;

use crate::domain::entities::{ApplyPlan, ApplyReport, InstanceRecord};
use crate::domain::value_objects::FleetLayout;
use crate::error::RolloutResult;

/// Identity under which procedures run on a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Elevation {
    /// As the login user, without elevation (only when explicitly allowed)
    Current,
    /// The login user is already root
    Root,
    /// `sudo -n`, pre-authorised
    Sudo,
    /// `sudo` allowed to prompt over an interactive channel
    SudoPrompt,
}

/// Who a probe ran as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeIdentity {
    pub uid: u32,
    pub user: String,
}

impl ProbeIdentity {
    pub fn is_root(&self) -> bool {
        self.uid == 0
    }
}

/// Batched service manager actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Reload,
    Restart,
}

impl ServiceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceAction::Reload => "reload",
            ServiceAction::Restart => "restart",
        }
    }
}

/// Typed procedures against one host.
///
/// Connection failures surface as `RolloutError::ConnectionFailed`.
pub trait HostShell {
    /// Human-readable name used in output and error messages
    fn label(&self) -> String;

    /// Whether this channel can satisfy an interactive elevation prompt
    fn supports_prompt(&self) -> bool;

    /// Report who procedures run as under `elevation`.
    ///
    /// `Ok(None)` means the elevation was refused.
    fn probe(&self, elevation: Elevation) -> RolloutResult<Option<ProbeIdentity>>;

    /// Enumerate instance records under the layout's registry
    fn snapshot(&self, elevation: Elevation, layout: &FleetLayout)
        -> RolloutResult<Vec<InstanceRecord>>;

    /// Read files; `None` for files that are missing or unreadable
    fn read_files(
        &self,
        elevation: Elevation,
        paths: &[PathBuf],
    ) -> RolloutResult<Vec<(PathBuf, Option<String>)>>;

    /// Apply writes, key installation and purges in one call
    fn apply(&self, elevation: Elevation, plan: &ApplyPlan) -> RolloutResult<ApplyReport>;

    /// Subset of `units` currently active
    fn active_units(&self, elevation: Elevation, units: &[String]) -> RolloutResult<Vec<String>>;

    /// One batched service manager call; `Ok(false)` when it reported failure
    fn service_action(
        &self,
        elevation: Elevation,
        action: ServiceAction,
        units: &[String],
    ) -> RolloutResult<bool>;
}
