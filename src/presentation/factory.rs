//! Use Case Factory
//!
//! Wires the rollout use case and its hosts to the concrete shells,
//! the key-material deriver and the event sink chosen by the output format.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::application::{RolloutHost, RolloutUseCase};
use crate::config::Config;
use crate::domain::ports::RolloutEventSink;
use crate::domain::value_objects::{ResolvedTargets, Topology};
use crate::infrastructure::{
    JsonEventSink, KeyMaterialDeriver, LocalShell, LocalTransport, SshShell, SshTransport,
};

use super::events::ConsoleEventSink;
use super::output::{OutputFormat, TextStyle};

/// One host per target, or the local host when there are none
pub fn create_hosts(resolved: &ResolvedTargets, config: &Config) -> Vec<RolloutHost> {
    match resolved.topology {
        Topology::Local => vec![RolloutHost::new(
            Box::new(LocalShell::new(LocalTransport::new())),
            None,
        )],
        topology => resolved
            .targets
            .iter()
            .map(|target| {
                let transport =
                    SshTransport::new(target.clone(), config.ssh.clone(), topology.is_interactive());
                RolloutHost::new(Box::new(SshShell::new(transport)), Some(target.clone()))
            })
            .collect(),
    }
}

/// Event sink for the chosen output format
pub fn create_event_sink(format: OutputFormat, style: TextStyle) -> Arc<dyn RolloutEventSink> {
    match format {
        OutputFormat::Json => Arc::new(JsonEventSink::stdout()),
        OutputFormat::Text => Arc::new(ConsoleEventSink::new(style)),
    }
}

/// Create a rollout use case with all dependencies wired up
pub fn create_rollout_use_case(
    config: &Config,
    events: Arc<dyn RolloutEventSink>,
    interrupted: Arc<AtomicBool>,
) -> RolloutUseCase {
    let deriver = KeyMaterialDeriver::new(config.identifier.derive_command.clone());
    RolloutUseCase::new(Box::new(deriver))
        .with_events(events)
        .with_interrupt(interrupted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Target;

    #[test]
    fn local_topology_yields_one_local_host() {
        let resolved = ResolvedTargets {
            topology: Topology::Local,
            targets: Vec::new(),
        };
        let hosts = create_hosts(&resolved, &Config::default());
        assert_eq!(hosts.len(), 1);
        assert!(hosts[0].target.is_none());
        assert_eq!(hosts[0].label(), "localhost");
    }

    #[test]
    fn batch_topology_yields_one_host_per_target() {
        let resolved = ResolvedTargets {
            topology: Topology::BatchRemote,
            targets: vec![
                Target::new("relay1", None, None),
                Target::new("relay2", Some("admin".into()), Some(2222)),
            ],
        };
        let hosts = create_hosts(&resolved, &Config::default());
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[1].target.as_ref().map(|t| t.host()), Some("relay2"));
    }
}
