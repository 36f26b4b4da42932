//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod family_id;
mod layout;
mod target;
mod topology;

pub use family_id::{FamilyId, FAMILY_ID_DIRECTIVE, MY_FAMILY_DIRECTIVE};
pub use layout::{is_valid_instance_name, FleetLayout};
pub use target::{
    load_target_list, parse_target_list, Target, TargetIdentity, TargetOverrides,
    DEFAULT_SSH_PORT,
};
pub use topology::{select_topology, ResolvedTargets, TargetSelection, Topology};
