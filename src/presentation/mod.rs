//! Presentation Layer
//!
//! This layer handles:
//! - CLI argument parsing (via clap)
//! - Wiring the rollout use case to concrete shells and sinks
//! - Output formatting (text/JSON)
//!
//! ## Structure
//!
//! - `cli` - clap definitions
//! - `factory` - Creates use cases and hosts (dependency injection)
//! - `output` - Outcome and summary rendering
//! - `events` - Console sink streaming outcomes as targets finish
//! - `diff` - Config diffs for `--dry-run -v`

pub mod cli;
pub mod diff;
pub mod events;
pub mod factory;
pub mod output;

pub use cli::{Cli, Commands};
pub use factory::{create_event_sink, create_hosts, create_rollout_use_case};
pub use output::{OutputFormat, TextStyle};
