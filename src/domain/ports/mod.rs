//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod host_shell;
pub mod identifier_deriver;
pub mod rollout_events;

pub use host_shell::{Elevation, HostShell, ProbeIdentity, ServiceAction};
pub use identifier_deriver::IdentifierDeriver;
pub use rollout_events::{NoopEventSink, Phase, RolloutEvent, RolloutEventSink};
