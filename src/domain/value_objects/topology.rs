//! Topology value object - which execution strategy a rollout uses.

use serde::Serialize;

use super::target::Target;

/// Execution strategy for one invocation.
///
/// Chosen once by [`select_topology`] and never changed mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    /// Operate on this host's filesystem and service manager
    Local,
    /// One remote host over a pty-backed channel; remote sudo may prompt
    SingleRemoteInteractive,
    /// One or more remote hosts, never prompting
    BatchRemote,
}

impl Topology {
    pub fn is_remote(self) -> bool {
        !matches!(self, Topology::Local)
    }

    pub fn is_interactive(self) -> bool {
        matches!(self, Topology::SingleRemoteInteractive)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Topology::Local => "local",
            Topology::SingleRemoteInteractive => "single-remote-interactive",
            Topology::BatchRemote => "batch-remote",
        }
    }
}

/// Targets as the operator supplied them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    /// No targeting flag: the local host
    None,
    /// `--remote HOST`
    Single(Target),
    /// `--servers FILE`
    List(Vec<Target>),
}

/// Outcome of topology selection: the strategy plus the targets it drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTargets {
    pub topology: Topology,
    pub targets: Vec<Target>,
}

/// Select the topology for this invocation.
///
/// A single target without a controlling terminal is downgraded to batch mode
/// so unattended runs never wait on a prompt nobody can answer.
pub fn select_topology(selection: TargetSelection, terminal_attached: bool) -> ResolvedTargets {
    match selection {
        TargetSelection::None => ResolvedTargets {
            topology: Topology::Local,
            targets: Vec::new(),
        },
        TargetSelection::Single(target) => ResolvedTargets {
            topology: if terminal_attached {
                Topology::SingleRemoteInteractive
            } else {
                Topology::BatchRemote
            },
            targets: vec![target],
        },
        TargetSelection::List(targets) => ResolvedTargets {
            topology: Topology::BatchRemote,
            targets,
        },
    }
}
