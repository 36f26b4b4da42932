//! Host shells
//!
//! - `script` - renders procedures as base64-framed `sh` scripts
//! - `snapshot` - decodes the records procedures print
//! - `transport` - `ScriptTransport` trait and the `ScriptShell` host shell
//! - `local` / `ssh` - the two transports

pub mod local;
pub mod script;
pub mod snapshot;
pub mod ssh;
pub mod transport;

pub use local::LocalTransport;
pub use ssh::SshTransport;
pub use transport::{ScriptOutput, ScriptShell, ScriptTransport};

/// Shell on this machine
pub type LocalShell = ScriptShell<LocalTransport>;

/// Shell on a remote machine
pub type SshShell = ScriptShell<SshTransport>;
