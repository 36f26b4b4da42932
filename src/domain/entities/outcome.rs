//! Rollout outcome - the in-memory report of what happened on one target.

use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::error::RolloutError;

/// Per-target status token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ok,
    Failed,
    Noop,
    Skipped,
}

impl OutcomeStatus {
    /// Token printed at the start of every per-target line
    pub fn token(self) -> &'static str {
        match self {
            OutcomeStatus::Ok => "[ok]",
            OutcomeStatus::Failed => "[failed]",
            OutcomeStatus::Noop => "[noop]",
            OutcomeStatus::Skipped => "[skipped]",
        }
    }
}

/// One intended or performed change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlannedChange {
    ConfigEdit {
        path: PathBuf,
        directives: Vec<String>,
        /// Instances whose effective configuration this file feeds
        instances: Vec<String>,
        #[serde(skip)]
        before: String,
        #[serde(skip)]
        after: String,
    },
    KeyInstall {
        instance: String,
        key_dir: PathBuf,
    },
    KeyPurge {
        instance: String,
        key_dir: PathBuf,
    },
}

impl PlannedChange {
    pub fn describe(&self) -> String {
        match self {
            PlannedChange::ConfigEdit {
                path, directives, ..
            } => format!("edit {} ({})", path.display(), directives.join(", ")),
            PlannedChange::KeyInstall { instance, key_dir } => {
                format!("install key for {} into {}", instance, key_dir.display())
            }
            PlannedChange::KeyPurge { instance, key_dir } => {
                format!("purge keys of {} from {}", instance, key_dir.display())
            }
        }
    }
}

/// Read-only view of one instance, produced by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceStatus {
    pub name: String,
    pub running: bool,
    pub key_installed: bool,
    /// Whether an installed key matches the operator's credential, when one was given
    pub key_matches: Option<bool>,
    pub family_id: Option<String>,
    /// File the effective `FamilyId` was found in
    pub family_id_origin: Option<PathBuf>,
    /// Number of fingerprints the effective `MyFamily` lists
    pub my_family: Option<usize>,
    pub fingerprint: Option<String>,
    pub warnings: Vec<String>,
}

/// A collected relay fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintEntry {
    pub instance: String,
    pub nickname: String,
    pub fingerprint: String,
}

/// What happened on one target
#[derive(Debug, Serialize)]
pub struct RolloutOutcome {
    pub target: String,
    pub status: OutcomeStatus,
    pub instances_touched: usize,
    pub reloaded: usize,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<RolloutError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<PlannedChange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<InstanceStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fingerprints: Vec<FingerprintEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl RolloutOutcome {
    pub fn new(target: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            target: target.into(),
            status,
            instances_touched: 0,
            reloaded: 0,
            error: None,
            changes: Vec::new(),
            instances: Vec::new(),
            fingerprints: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn failed(target: impl Into<String>, error: RolloutError) -> Self {
        let mut outcome = Self::new(target, OutcomeStatus::Failed);
        outcome.error = Some(error);
        outcome
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Ok | OutcomeStatus::Noop)
    }
}

#[derive(Serialize)]
struct ErrorView<'a> {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    remediation: Option<&'a str>,
}

fn serialize_error<S: Serializer>(error: &Option<RolloutError>, s: S) -> Result<S::Ok, S::Error> {
    error
        .as_ref()
        .map(|e| ErrorView {
            kind: e.kind(),
            message: e.to_string(),
            remediation: e.remediation(),
        })
        .serialize(s)
}
