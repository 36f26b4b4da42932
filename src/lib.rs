//! relayctl - family key and configuration rollout for Tor relay fleets
//!
//! relayctl installs a relay family key into every tor instance on a host (or
//! on many hosts over ssh), keeps `FamilyId` and `MyFamily` in step across the
//! fleet, and reloads only the instances it touched.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::{FleetSummary, Operation, RolloutContext, RolloutHost, RolloutUseCase};
pub use config::Config;
pub use error::{RolloutError, RolloutResult};
