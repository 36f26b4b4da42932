//! Configuration module for relayctl
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (RELAYCTL_*)
//! 3. Config file (`--config`, `$RELAYCTL_CONFIG`, or ~/.config/relayctl/config.toml)
//! 4. Built-in defaults (lowest priority)

mod loader;
mod types;

pub use loader::{ConfigWarning, CONFIG_ENV};
pub use types::{
    Config, IdentifierConfig, KeygenConfig, PrivilegeConfig, ReloadConfig, SshConfig,
};
