//! Rollout Options
//!
//! The per-invocation context and the operation being rolled out.

use crate::domain::services::PrivilegePolicy;
use crate::domain::value_objects::{FleetLayout, Topology};

/// Operation run against every target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Install the credential only
    ImportKey,
    /// Install the credential and set `FamilyId`
    Deploy { legacy_family: bool },
    /// Remove `FamilyId` (and optionally `MyFamily` and the installed keys)
    Remove { legacy_family: bool, purge_key: bool },
    /// Set `MyFamily` from fingerprints collected across the fleet
    DeployMyFamily,
    /// Read-only report
    Status,
    /// Read-only fingerprint listing
    CollectFingerprints,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::ImportKey => "import-key",
            Operation::Deploy { .. } => "deploy",
            Operation::Remove { .. } => "remove",
            Operation::DeployMyFamily => "deploy-myfamily",
            Operation::Status => "status",
            Operation::CollectFingerprints => "collect-fingerprints",
        }
    }

    pub fn needs_credential(self) -> bool {
        matches!(self, Operation::ImportKey | Operation::Deploy { .. })
    }

    pub fn needs_identifier(self) -> bool {
        matches!(self, Operation::Deploy { .. })
    }

    /// Whether every target must be enumerated before the first one changes
    pub fn needs_fleet_survey(self) -> bool {
        matches!(
            self,
            Operation::DeployMyFamily
                | Operation::Status
                | Operation::Deploy {
                    legacy_family: true
                }
        )
    }

    pub fn is_read_only(self) -> bool {
        matches!(self, Operation::Status | Operation::CollectFingerprints)
    }
}

/// Immutable per-invocation view, built once and passed by reference
#[derive(Debug, Clone)]
pub struct RolloutContext {
    pub topology: Topology,
    pub dry_run: bool,
    /// `--no-reload` or `reload.enabled = false`
    pub no_reload: bool,
    pub verbosity: u8,
    pub layout: FleetLayout,
    pub privilege: PrivilegePolicy,
    /// `--instance` filter; empty means all
    pub instances: Vec<String>,
    /// `--family-id`
    pub family_id: Option<String>,
}

impl RolloutContext {
    pub fn new(topology: Topology, privilege: PrivilegePolicy) -> Self {
        Self {
            topology,
            dry_run: false,
            no_reload: false,
            verbosity: 0,
            layout: FleetLayout::default(),
            privilege,
            instances: Vec::new(),
            family_id: None,
        }
    }

    pub fn with_layout(mut self, layout: FleetLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_no_reload(mut self, no_reload: bool) -> Self {
        self.no_reload = no_reload;
        self
    }

    pub fn with_family_id(mut self, family_id: Option<String>) -> Self {
        self.family_id = family_id;
        self
    }

    pub fn with_instances(mut self, instances: Vec<String>) -> Self {
        self.instances = instances;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn reload_enabled(&self) -> bool {
        !self.dry_run && !self.no_reload
    }

    pub fn is_remote(&self) -> bool {
        self.topology.is_remote()
    }
}
