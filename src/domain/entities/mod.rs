//! Domain Entities
//!
//! - `Instance` / `InstanceSnapshot` / `HostSnapshot` - what enumeration observes
//! - `Credential` - the family secret key
//! - `RelayFingerprint` - relay identity used by `MyFamily`
//! - `ApplyPlan` - the writes a host receives in one call
//! - `RolloutOutcome` - what happened on one target

mod apply_plan;
mod credential;
mod fingerprint;
mod instance;
mod outcome;

pub use apply_plan::{
    ApplyPlan, ApplyReport, CredentialSource, FileWrite, KeyDestination, KeyInstall,
};
pub use credential::{Credential, CREDENTIAL_SUFFIX, PUBLIC_ID_SUFFIX};
pub use fingerprint::{my_family_line, parse_my_family, RelayFingerprint};
pub use instance::{HostSnapshot, InstalledKey, Instance, InstanceRecord, InstanceSnapshot};
pub use outcome::{
    FingerprintEntry, InstanceStatus, OutcomeStatus, PlannedChange, RolloutOutcome,
};
