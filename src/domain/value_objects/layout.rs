//! Fleet layout - the naming convention that maps an instance name to its
//! config file, key directory and service unit.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const INSTANCE_PLACEHOLDER: &str = "{instance}";

/// Filesystem and service naming convention of a fleet.
///
/// Defaults follow the Debian `tor-instance-create` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetLayout {
    /// Directory with one subdirectory per instance
    pub registry_dir: PathBuf,
    /// Per-instance data directories live under this root
    pub data_root: PathBuf,
    /// Config file name inside each instance's registry directory
    pub config_name: String,
    /// Key directory name inside each instance's data directory
    pub key_dir_name: String,
    /// Fingerprint file name inside each instance's data directory
    pub fingerprint_name: String,
    /// Service unit name, `{instance}` is replaced with the instance name
    pub unit_template: String,
    /// Owner of installed keys; empty leaves ownership untouched
    pub service_user: String,
    /// Group of installed keys; empty leaves the group untouched
    pub service_group: String,
}

impl Default for FleetLayout {
    fn default() -> Self {
        Self {
            registry_dir: PathBuf::from("/etc/tor/instances"),
            data_root: PathBuf::from("/var/lib/tor-instances"),
            config_name: "torrc".to_string(),
            key_dir_name: "keys".to_string(),
            fingerprint_name: "fingerprint".to_string(),
            unit_template: "tor@{instance}.service".to_string(),
            service_user: "_tor-{instance}".to_string(),
            service_group: "_tor-{instance}".to_string(),
        }
    }
}

impl FleetLayout {
    pub fn config_path(&self, instance: &str) -> PathBuf {
        self.registry_dir.join(instance).join(&self.config_name)
    }

    pub fn key_dir(&self, instance: &str) -> PathBuf {
        self.data_root.join(instance).join(&self.key_dir_name)
    }

    pub fn fingerprint_path(&self, instance: &str) -> PathBuf {
        self.data_root.join(instance).join(&self.fingerprint_name)
    }

    pub fn unit(&self, instance: &str) -> String {
        self.unit_template.replace(INSTANCE_PLACEHOLDER, instance)
    }

    /// Unit template split around the placeholder, for scripts that build
    /// unit names from discovered instances
    pub fn unit_parts(&self) -> (&str, &str) {
        self.unit_template
            .split_once(INSTANCE_PLACEHOLDER)
            .unwrap_or((self.unit_template.as_str(), ""))
    }

    pub fn owner(&self, instance: &str) -> Option<String> {
        expand_optional(&self.service_user, instance)
    }

    pub fn group(&self, instance: &str) -> Option<String> {
        expand_optional(&self.service_group, instance)
    }
}

/// Instance names become path components and unit names; keep them plain.
pub fn is_valid_instance_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn expand_optional(template: &str, instance: &str) -> Option<String> {
    let trimmed = template.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.replace(INSTANCE_PLACEHOLDER, instance))
    }
}
