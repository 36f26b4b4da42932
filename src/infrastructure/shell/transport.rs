//! Script transports and the `HostShell` built on them.

use std::path::PathBuf;

use crate::domain::entities::{ApplyPlan, ApplyReport, InstanceRecord};
use crate::domain::ports::{Elevation, HostShell, ProbeIdentity, ServiceAction};
use crate::domain::value_objects::FleetLayout;
use crate::error::{RolloutError, RolloutResult};

use super::script::{self, DIGEST_MISMATCH_STATUS};
use super::snapshot::RecordReader;

/// What a script run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs a rendered procedure on one host under a given elevation.
///
/// Implementations report an unreachable host as
/// `RolloutError::ConnectionFailed`; every other non-zero exit is returned in
/// [`ScriptOutput::status`].
pub trait ScriptTransport {
    fn label(&self) -> String;

    /// Whether `Elevation::SudoPrompt` can reach a human
    fn can_prompt(&self) -> bool;

    fn run(&self, elevation: Elevation, script: &str) -> RolloutResult<ScriptOutput>;
}

/// `HostShell` that renders procedures and runs them through a transport
pub struct ScriptShell<T> {
    transport: T,
}

impl<T: ScriptTransport> ScriptShell<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run a procedure that must succeed; returns its stdout
    fn execute(&self, step: &'static str, elevation: Elevation, script: &str) -> RolloutResult<String> {
        let output = self.transport.run(elevation, script)?;
        if !output.success() {
            return Err(RolloutError::CommandFailed {
                target: self.transport.label(),
                step,
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

impl<T: ScriptTransport> HostShell for ScriptShell<T> {
    fn label(&self) -> String {
        self.transport.label()
    }

    fn supports_prompt(&self) -> bool {
        self.transport.can_prompt()
    }

    fn probe(&self, elevation: Elevation) -> RolloutResult<Option<ProbeIdentity>> {
        let output = self.transport.run(elevation, &script::probe())?;
        if !output.success() || !RecordReader::started(&output.stdout) {
            tracing::debug!(host = %self.label(), ?elevation, status = output.status, "probe refused");
            return Ok(None);
        }
        let label = self.label();
        RecordReader::new(&label).probe(&output.stdout).map(Some)
    }

    fn snapshot(
        &self,
        elevation: Elevation,
        layout: &FleetLayout,
    ) -> RolloutResult<Vec<InstanceRecord>> {
        let stdout = self.execute("snapshot", elevation, &script::snapshot(layout))?;
        let label = self.label();
        RecordReader::new(&label).snapshot(&stdout)
    }

    fn read_files(
        &self,
        elevation: Elevation,
        paths: &[PathBuf],
    ) -> RolloutResult<Vec<(PathBuf, Option<String>)>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let stdout = self.execute("read", elevation, &script::read_files(paths))?;
        let label = self.label();
        RecordReader::new(&label).files(&stdout)
    }

    fn apply(&self, elevation: Elevation, plan: &ApplyPlan) -> RolloutResult<ApplyReport> {
        if plan.is_empty() {
            return Ok(ApplyReport::default());
        }
        let output = self.transport.run(elevation, &script::apply(plan))?;
        if !output.success() {
            let message = if output.status == DIGEST_MISMATCH_STATUS {
                "credential digest mismatch after transfer".to_string()
            } else {
                format!("exit {}: {}", output.status, output.stderr.trim())
            };
            return Err(RolloutError::MutationFailed {
                target: self.label(),
                message,
            });
        }
        let label = self.label();
        RecordReader::new(&label).apply_report(&output.stdout)
    }

    fn active_units(&self, elevation: Elevation, units: &[String]) -> RolloutResult<Vec<String>> {
        if units.is_empty() {
            return Ok(Vec::new());
        }
        let stdout = self.execute("is-active", elevation, &script::active_units(units))?;
        let label = self.label();
        RecordReader::new(&label).units(&stdout)
    }

    fn service_action(
        &self,
        elevation: Elevation,
        action: ServiceAction,
        units: &[String],
    ) -> RolloutResult<bool> {
        let output = self
            .transport
            .run(elevation, &script::service_action(action, units))?;
        let label = self.label();
        let status = if RecordReader::started(&output.stdout) {
            RecordReader::new(&label).service_status(&output.stdout)?
        } else {
            None
        };
        match status {
            Some(ok) => Ok(ok),
            None => Err(RolloutError::ReloadFailed {
                target: label,
                message: format!("systemctl {}: {}", action.as_str(), output.stderr.trim()),
            }),
        }
    }
}
