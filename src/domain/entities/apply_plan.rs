//! Apply plan - the complete set of writes a host receives in one call.

use std::path::PathBuf;

use serde::Serialize;

/// Replace a file's content (ownership and mode are preserved)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub path: PathBuf,
    pub content: String,
}

/// Where the credential bytes come from when installing
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// The operator's file on the same host
    LocalPath(PathBuf),
    /// Bytes shipped inside the remote procedure
    Inline(Vec<u8>),
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalPath(p) => f.debug_tuple("LocalPath").field(p).finish(),
            Self::Inline(bytes) => write!(f, "Inline({} bytes)", bytes.len()),
        }
    }
}

/// One key directory receiving the credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDestination {
    pub instance: String,
    pub key_dir: PathBuf,
    pub owner: Option<String>,
    pub group: Option<String>,
}

/// Credential installation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInstall {
    pub source: CredentialSource,
    pub file_name: String,
    pub sha256: String,
    pub destinations: Vec<KeyDestination>,
}

/// Everything to change on one host
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyPlan {
    pub writes: Vec<FileWrite>,
    pub install: Option<KeyInstall>,
    /// Key directories whose family keys are deleted
    pub purge: Vec<PathBuf>,
}

impl ApplyPlan {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
            && self
                .install
                .as_ref()
                .map_or(true, |i| i.destinations.is_empty())
            && self.purge.is_empty()
    }
}

/// What a host reported back after applying a plan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyReport {
    pub written: Vec<PathBuf>,
    pub installed: Vec<PathBuf>,
    pub purged: Vec<PathBuf>,
}
