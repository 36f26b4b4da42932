//! Application Layer
//!
//! Use cases that orchestrate the rollout flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `RolloutUseCase` - Runs an operation (deploy, remove, status, ...) across the fleet

pub mod rollout;

pub use rollout::{
    FleetSummary, Operation, RolloutContext, RolloutHost, RolloutUseCase, SummaryTotals,
};
