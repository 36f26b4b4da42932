//! Domain Services
//!
//! Rollout logic that operates on domain entities. Services touch hosts only
//! through the `HostShell` port and are tested against an in-memory host.

pub mod enumerator;
pub mod identifier;
pub mod mutator;
pub mod privilege;
pub mod reload;
pub mod shared_config;
pub mod transporter;

pub use enumerator::enumerate_instances;
pub use identifier::{resolve_identifier, IdentifierSource, ResolvedIdentifier};
pub use mutator::{apply_all, directive_values, DirectiveEdit, INCLUDE_KEYWORD};
pub use privilege::{negotiate, ElevationStrategy, Negotiated, PrivilegePolicy};
pub use reload::{reload_touched, ReloadReport, RELOAD_STRATEGIES};
pub use shared_config::{detect_shared_config, include_targets, partially_shared_config};
pub use transporter::{plan_install, plan_purge};
