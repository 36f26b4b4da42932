//! Privilege negotiation
//!
//! Finds the first elevation a host grants, trying strategies in order:
//! unprivileged (when allowed), already root, passwordless sudo, then an
//! interactive sudo prompt on a pty-backed channel.

use crate::domain::ports::{Elevation, HostShell, ProbeIdentity};
use crate::domain::value_objects::{Target, Topology, DEFAULT_SSH_PORT};
use crate::error::{RolloutError, RolloutResult};

/// File the suggested sudoers grant is written to
const SUDOERS_DROP_IN: &str = "/etc/sudoers.d/relayctl";

/// Inputs to negotiation that do not depend on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegePolicy {
    pub topology: Topology,
    pub terminal_attached: bool,
    pub allow_unprivileged: bool,
}

/// One way of obtaining the rights a rollout needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationStrategy {
    UnprivilegedAllowed,
    AlreadyRoot,
    PasswordlessSudo,
    InteractivePrompt,
}

impl ElevationStrategy {
    /// Strategies in the order they are tried under `policy`
    pub fn ordered(policy: &PrivilegePolicy) -> Vec<ElevationStrategy> {
        let mut strategies = Vec::with_capacity(4);
        if policy.allow_unprivileged {
            strategies.push(ElevationStrategy::UnprivilegedAllowed);
        }
        strategies.push(ElevationStrategy::AlreadyRoot);
        strategies.push(ElevationStrategy::PasswordlessSudo);
        if policy.topology.is_interactive() && policy.terminal_attached {
            strategies.push(ElevationStrategy::InteractivePrompt);
        }
        strategies
    }

    /// `Ok(Err(reason))` is a rejection; `Err` is a channel failure.
    fn attempt(
        self,
        shell: &dyn HostShell,
        identity: &ProbeIdentity,
    ) -> RolloutResult<Result<Elevation, String>> {
        match self {
            ElevationStrategy::UnprivilegedAllowed => Ok(Ok(Elevation::Current)),
            ElevationStrategy::AlreadyRoot => Ok(if identity.is_root() {
                Ok(Elevation::Root)
            } else {
                Err(format!("logged in as {} (uid {})", identity.user, identity.uid))
            }),
            ElevationStrategy::PasswordlessSudo => Ok(match shell.probe(Elevation::Sudo)? {
                Some(id) if id.is_root() => Ok(Elevation::Sudo),
                _ => Err("sudo requires a password".to_string()),
            }),
            ElevationStrategy::InteractivePrompt => {
                if !shell.supports_prompt() {
                    return Ok(Err("channel cannot prompt".to_string()));
                }
                Ok(match shell.probe(Elevation::SudoPrompt)? {
                    Some(id) if id.is_root() => Ok(Elevation::SudoPrompt),
                    _ => Err("sudo authentication failed".to_string()),
                })
            }
        }
    }
}

/// Result of a successful negotiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub elevation: Elevation,
    pub identity: ProbeIdentity,
}

/// Negotiate elevation on the host behind `shell`.
///
/// `remote` is the target when the shell is a remote channel and is used to
/// phrase the remediation command.
pub fn negotiate(
    shell: &dyn HostShell,
    policy: &PrivilegePolicy,
    remote: Option<&Target>,
) -> RolloutResult<Negotiated> {
    let identity = shell
        .probe(Elevation::Current)?
        .ok_or_else(|| RolloutError::Protocol {
            target: shell.label(),
            message: "identity probe returned nothing".to_string(),
        })?;

    let mut rejections = Vec::new();
    for strategy in ElevationStrategy::ordered(policy) {
        match strategy.attempt(shell, &identity)? {
            Ok(elevation) => {
                tracing::debug!(host = %shell.label(), ?strategy, ?elevation, "privileges negotiated");
                return Ok(Negotiated {
                    elevation,
                    identity,
                });
            }
            Err(reason) => {
                tracing::debug!(host = %shell.label(), ?strategy, %reason, "strategy rejected");
                rejections.push(reason);
            }
        }
    }

    Err(RolloutError::PrivilegeRequired {
        target: shell.label(),
        remediation: remediation(&identity.user, remote, &rejections),
    })
}

/// The grant that makes the next run succeed
fn remediation(user: &str, remote: Option<&Target>, rejections: &[String]) -> String {
    let grant = format!(
        "echo '{} ALL=(root) NOPASSWD: ALL' | sudo tee {} >/dev/null && sudo chmod 0440 {}",
        user, SUDOERS_DROP_IN, SUDOERS_DROP_IN
    );
    let hint = match remote {
        Some(target) => {
            let port = match target.port() {
                Some(port) if port != DEFAULT_SSH_PORT => format!(" -p {}", port),
                _ => String::new(),
            };
            format!("ssh -t{} {} \"{}\"", port, target.ssh_destination(), grant)
        }
        None => format!("re-run with sudo, or grant passwordless sudo: {}", grant),
    };
    match rejections.last() {
        Some(last) => format!("{} ({})", hint, last),
        None => hint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::host_shell::mock::MockHostShell;

    fn policy(topology: Topology, terminal: bool) -> PrivilegePolicy {
        PrivilegePolicy {
            topology,
            terminal_attached: terminal,
            allow_unprivileged: false,
        }
    }

    #[test]
    fn root_login_needs_no_sudo() {
        let mut shell = MockHostShell::new("relay1");
        shell.uid = 0;
        shell.passwordless_sudo = false;
        let result = negotiate(&shell, &policy(Topology::BatchRemote, false), None).unwrap();
        assert_eq!(result.elevation, Elevation::Root);
    }

    #[test]
    fn passwordless_sudo_is_used() {
        let shell = MockHostShell::new("relay1");
        let result = negotiate(&shell, &policy(Topology::BatchRemote, false), None).unwrap();
        assert_eq!(result.elevation, Elevation::Sudo);
        assert_eq!(result.identity.user, "admin");
    }

    #[test]
    fn batch_never_prompts_and_explains_the_grant() {
        let mut shell = MockHostShell::new("relay2");
        shell.passwordless_sudo = false;
        shell.prompt_succeeds = true;
        shell.interactive = true;
        let target = Target::new("relay2", Some("ops".to_string()), Some(2222));

        let err = negotiate(&shell, &policy(Topology::BatchRemote, false), Some(&target))
            .unwrap_err();
        let remediation = err.remediation().unwrap().to_string();
        assert_eq!(err.kind(), "PrivilegeRequired");
        assert!(remediation.starts_with("ssh -t -p 2222 ops@relay2 "));
        assert!(remediation.contains("admin ALL=(root) NOPASSWD: ALL"));
    }

    #[test]
    fn interactive_prompt_is_last_resort() {
        let mut shell = MockHostShell::new("relay1");
        shell.passwordless_sudo = false;
        shell.prompt_succeeds = true;
        shell.interactive = true;
        let result = negotiate(
            &shell,
            &policy(Topology::SingleRemoteInteractive, true),
            None,
        )
        .unwrap();
        assert_eq!(result.elevation, Elevation::SudoPrompt);
    }

    #[test]
    fn failed_prompt_is_explicit() {
        let mut shell = MockHostShell::new("relay1");
        shell.passwordless_sudo = false;
        shell.interactive = true;
        let err = negotiate(
            &shell,
            &policy(Topology::SingleRemoteInteractive, true),
            None,
        )
        .unwrap_err();
        assert!(err
            .remediation()
            .unwrap()
            .contains("sudo authentication failed"));
    }

    #[test]
    fn local_mode_never_prompts() {
        let strategies = ElevationStrategy::ordered(&policy(Topology::Local, true));
        assert!(!strategies.contains(&ElevationStrategy::InteractivePrompt));
    }

    #[test]
    fn unprivileged_allowed_comes_first() {
        let mut p = policy(Topology::Local, false);
        p.allow_unprivileged = true;
        let shell = MockHostShell::new("localhost");
        let result = negotiate(&shell, &p, None).unwrap();
        assert_eq!(result.elevation, Elevation::Current);
    }

    #[test]
    fn unreachable_host_is_a_connection_failure() {
        let mut shell = MockHostShell::new("down");
        shell.unreachable = true;
        let err = negotiate(&shell, &policy(Topology::BatchRemote, false), None).unwrap_err();
        assert_eq!(err.kind(), "ConnectionFailed");
    }
}
