//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all process and file I/O.
//!
//! ## Structure
//!
//! - `shell/` - `HostShell` implementations (local `sh`, remote `ssh`)
//! - `keygen` - family key generation and FamilyId derivation
//! - `events/` - event sinks for rollout progress

pub mod events;
pub mod keygen;
pub mod shell;

pub use events::JsonEventSink;
pub use keygen::{generate_family_key, GeneratedKey, KeyMaterialDeriver};
pub use shell::{LocalShell, LocalTransport, ScriptShell, SshShell, SshTransport};
