//! Command handlers
//!
//! Each handler turns parsed arguments into a use-case call and renders the
//! result. Handlers return `anyhow::Result`; `main` maps an `Err` to exit 1.

pub mod generate;
pub mod rollout;

use is_terminal::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};

use relayctl::config::Config;

/// Flags every subcommand inherits
#[derive(Debug, Clone, Copy)]
pub struct GlobalArgs<'a> {
    pub json: bool,
    pub verbose: u8,
    pub config: Option<&'a Path>,
}

/// Load the configuration, reporting unknown keys on stderr
pub fn load_config(globals: &GlobalArgs<'_>) -> Result<Config> {
    let (config, warnings) =
        Config::discover(globals.config).context("Failed to load configuration")?;
    for warning in &warnings {
        tracing::warn!(key = %warning.key, file = %warning.file.display(), "unknown config key");
        if !globals.json {
            eprintln!("Warning: {}", warning);
        }
    }
    Ok(config)
}

/// Colors only for a terminal, and never when `NO_COLOR` is set
pub fn use_color(json: bool) -> bool {
    !json && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// Both ends attached to a terminal: prompts can reach a human
pub fn terminal_attached() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}
