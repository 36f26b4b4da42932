//! Configuration type definitions

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::FleetLayout;
use crate::error::RolloutResult;

use super::loader::{self, ConfigWarning};

/// SSH channel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfig {
    /// Program used to reach remote hosts
    #[serde(default = "default_ssh_program")]
    pub program: String,

    /// Seconds before a connection attempt is abandoned
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Extra `-o` options passed to every ssh call (e.g. `StrictHostKeyChecking=accept-new`)
    #[serde(default)]
    pub options: Vec<String>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            program: default_ssh_program(),
            connect_timeout: default_connect_timeout(),
            options: Vec::new(),
        }
    }
}

fn default_ssh_program() -> String {
    "ssh".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

/// Privilege negotiation configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeConfig {
    /// Accept the login user as-is when the operator owns the fleet files
    #[serde(default)]
    pub allow_unprivileged: bool,
}

/// Identifier derivation configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierConfig {
    /// Command printing the FamilyId of a key; `{key}` is replaced with the key path
    #[serde(default)]
    pub derive_command: Option<String>,
}

/// Key generation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenConfig {
    /// tor binary used for `--keygen-family`
    #[serde(default = "default_tor_program")]
    pub tor: String,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            tor: default_tor_program(),
        }
    }
}

fn default_tor_program() -> String {
    "tor".to_string()
}

/// Service reload configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layout: FleetLayout,

    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub privilege: PrivilegeConfig,

    #[serde(default)]
    pub identifier: IdentifierConfig,

    #[serde(default)]
    pub keygen: KeygenConfig,

    #[serde(default)]
    pub reload: ReloadConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> RolloutResult<Self> {
        Ok(Self::load_with_warnings(path)?.0)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys)
    pub fn load_with_warnings(path: &Path) -> RolloutResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Resolve and load the effective configuration, env overrides applied
    pub fn discover(explicit: Option<&Path>) -> RolloutResult<(Self, Vec<ConfigWarning>)> {
        loader::discover(explicit)
    }

    /// Apply `RELAYCTL_*` environment overrides
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }
}
