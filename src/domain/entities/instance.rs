//! Instance entities - what an enumeration observes on one host.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::fingerprint::RelayFingerprint;

/// One managed relay instance.
///
/// `running` is a point-in-time observation taken during enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub name: String,
    pub config_path: PathBuf,
    pub key_dir: PathBuf,
    pub unit: String,
    pub running: bool,
}

/// A family key file found in an instance's key directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledKey {
    pub file_name: String,
    pub sha256: String,
}

/// Raw per-instance record as reported by a host shell.
///
/// Names are not yet validated; the enumerator turns records into
/// [`InstanceSnapshot`]s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceRecord {
    pub name: String,
    pub config: Option<String>,
    pub fingerprint: Option<String>,
    pub keys: Vec<InstalledKey>,
    pub active: bool,
}

/// An instance together with the file contents the rollout needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSnapshot {
    pub instance: Instance,
    /// Config text, `None` when unreadable
    pub config: Option<String>,
    pub fingerprint: Option<RelayFingerprint>,
    pub keys: Vec<InstalledKey>,
}

impl InstanceSnapshot {
    pub fn name(&self) -> &str {
        &self.instance.name
    }

    /// Whether a key with this name and digest is already installed
    pub fn has_key(&self, file_name: &str, sha256: &str) -> bool {
        self.keys
            .iter()
            .any(|k| k.file_name == file_name && k.sha256.eq_ignore_ascii_case(sha256))
    }
}

/// Everything one enumeration learned about a host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostSnapshot {
    pub instances: Vec<InstanceSnapshot>,
    /// Contents of files referenced by `%include`, `None` when unreadable
    pub included: BTreeMap<PathBuf, Option<String>>,
}

impl HostSnapshot {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn included_content(&self, path: &Path) -> Option<&str> {
        self.included.get(path).and_then(|c| c.as_deref())
    }

    pub fn instance_names(&self) -> Vec<String> {
        self.instances.iter().map(|i| i.name().to_string()).collect()
    }
}
