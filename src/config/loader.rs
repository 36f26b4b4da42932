//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RolloutError, RolloutResult};

use super::types::Config;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "RELAYCTL_CONFIG";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown config key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> RolloutResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|e| RolloutError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| RolloutError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
                file: path.to_path_buf(),
                key,
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Config file to load: `--config`, then `$RELAYCTL_CONFIG`, then the user
/// config if it exists. A path named explicitly is returned even when missing
/// so loading it fails.
pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("relayctl").join("config.toml"))
        .filter(|path| path.exists())
}

/// Load the effective configuration and apply environment overrides.
pub fn discover(explicit: Option<&Path>) -> RolloutResult<(Config, Vec<ConfigWarning>)> {
    let (config, warnings) = match resolve_path(explicit) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            load_with_warnings(&path)?
        }
        None => (Config::default(), Vec::new()),
    };
    Ok((with_env_overrides(config), warnings))
}

/// Apply environment variable overrides (RELAYCTL_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_overrides(config, |key| std::env::var(key).ok())
}

pub(crate) fn apply_overrides(
    mut config: Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Config {
    if let Some(program) = lookup("RELAYCTL_SSH_PROGRAM").filter(|v| !v.is_empty()) {
        config.ssh.program = program;
    }

    if let Some(timeout) = lookup("RELAYCTL_CONNECT_TIMEOUT") {
        match timeout.trim().parse() {
            Ok(secs) => config.ssh.connect_timeout = secs,
            Err(_) => tracing::warn!(value = %timeout, "ignoring invalid RELAYCTL_CONNECT_TIMEOUT"),
        }
    }

    if let Some(val) = lookup("RELAYCTL_ALLOW_UNPRIVILEGED") {
        config.privilege.allow_unprivileged = is_truthy(&val);
    }

    if let Some(dir) = lookup("RELAYCTL_REGISTRY_DIR").filter(|v| !v.is_empty()) {
        config.layout.registry_dir = PathBuf::from(dir);
    }

    if let Some(dir) = lookup("RELAYCTL_DATA_ROOT").filter(|v| !v.is_empty()) {
        config.layout.data_root = PathBuf::from(dir);
    }

    // Empty values are meaningful here: they disable chown.
    if let Some(user) = lookup("RELAYCTL_SERVICE_USER") {
        config.layout.service_user = user;
    }
    if let Some(group) = lookup("RELAYCTL_SERVICE_GROUP") {
        config.layout.service_group = group;
    }

    if let Some(command) = lookup("RELAYCTL_DERIVE_COMMAND") {
        config.identifier.derive_command = Some(command).filter(|c| !c.trim().is_empty());
    }

    if let Some(tor) = lookup("RELAYCTL_TOR").filter(|v| !v.is_empty()) {
        config.keygen.tor = tor;
    }

    if let Some(val) = lookup("RELAYCTL_RELOAD") {
        config.reload.enabled = is_truthy(&val);
    }

    config
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    value != "false" && value != "0" && value != "no" && !value.is_empty()
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.contains(needle))
        .map(|i| i + 1)
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "layout",
        "registry_dir",
        "data_root",
        "config_name",
        "key_dir_name",
        "fingerprint_name",
        "unit_template",
        "service_user",
        "service_group",
        "ssh",
        "program",
        "connect_timeout",
        "options",
        "privilege",
        "allow_unprivileged",
        "identifier",
        "derive_command",
        "keygen",
        "tor",
        "reload",
        "enabled",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
