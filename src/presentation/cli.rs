//! CLI Argument Parsing
//!
//! This module defines the CLI interface using clap.
//!
//! ## Design Notes
//!
//! - Global flags (--json, --verbose, --config) are inherited by all subcommands
//! - Every rollout subcommand has a `-remote` twin that requires `--remote` or
//!   `--servers`; the plain form runs locally unless one of them is given

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// relayctl - family key and configuration rollout for Tor relay fleets
#[derive(Parser, Debug)]
#[command(name = "relayctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Machine-readable output (one JSON event per line)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v shows diffs on --dry-run, -vv debug logs)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: $RELAYCTL_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the rollout runs
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetArgs {
    /// One remote host: [user@]host[:port]
    #[arg(long, value_name = "HOST", conflicts_with = "servers")]
    pub remote: Option<String>,

    /// File listing remote hosts, one [user@]host[:port] per line
    #[arg(long, value_name = "FILE")]
    pub servers: Option<PathBuf>,

    /// SSH user for targets that do not name one
    #[arg(long)]
    pub user: Option<String>,

    /// SSH port for targets that do not name one
    #[arg(long)]
    pub port: Option<u16>,

    /// Only act on this instance (repeatable)
    #[arg(long = "instance", value_name = "NAME")]
    pub instances: Vec<String>,
}

impl TargetArgs {
    pub fn has_remote(&self) -> bool {
        self.remote.is_some() || self.servers.is_some()
    }
}

/// Flags shared by every mutating subcommand
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    /// Detect and report the intended changes without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not reload or restart the touched instances
    #[arg(long)]
    pub no_reload: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ImportKeyArgs {
    /// Family secret key (*.secret_family_key)
    #[arg(long, value_name = "FILE")]
    pub key: PathBuf,

    #[command(flatten)]
    pub targets: TargetArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DeployArgs {
    /// Family secret key (*.secret_family_key)
    #[arg(long, value_name = "FILE")]
    pub key: PathBuf,

    /// Use this FamilyId instead of resolving one
    #[arg(long, value_name = "ID")]
    pub family_id: Option<String>,

    /// Also write MyFamily with fingerprints collected from the fleet
    #[arg(long)]
    pub legacy_family: bool,

    #[command(flatten)]
    pub targets: TargetArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StatusArgs {
    /// Compare installed keys against this credential
    #[arg(long, value_name = "FILE")]
    pub key: Option<PathBuf>,

    #[command(flatten)]
    pub targets: TargetArgs,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MyFamilyArgs {
    #[command(flatten)]
    pub targets: TargetArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RemoveArgs {
    /// Also remove MyFamily
    #[arg(long)]
    pub legacy_family: bool,

    /// Also delete installed *.secret_family_key files
    #[arg(long)]
    pub purge_key: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    #[command(flatten)]
    pub targets: TargetArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CollectArgs {
    /// Also write the fingerprint list to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub targets: TargetArgs,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    /// Family name; the key is written as <NAME>.secret_family_key
    pub name: String,

    /// Directory receiving the key files
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a family key with `tor --keygen-family`
    Generate(GenerateArgs),

    /// Install the family key into every instance
    ImportKey(ImportKeyArgs),

    /// Install the family key on remote hosts
    ImportKeyRemote(ImportKeyArgs),

    /// Install the family key and set FamilyId everywhere
    Deploy(DeployArgs),

    /// Install the family key and set FamilyId on remote hosts
    DeployRemote(DeployArgs),

    /// Report keys, FamilyId and MyFamily per instance
    Status(StatusArgs),

    /// Report keys, FamilyId and MyFamily on remote hosts
    StatusRemote(StatusArgs),

    /// Print the fingerprint of every instance
    CollectFingerprints(CollectArgs),

    /// Set MyFamily from fingerprints collected across the fleet
    #[command(name = "deploy-myfamily")]
    DeployMyFamily(MyFamilyArgs),

    /// Set MyFamily on remote hosts
    #[command(name = "deploy-myfamily-remote")]
    DeployMyFamilyRemote(MyFamilyArgs),

    /// Remove FamilyId (and optionally MyFamily and the keys)
    Remove(RemoveArgs),

    /// Remove FamilyId on remote hosts
    RemoveRemote(RemoveArgs),
}

impl Commands {
    /// Whether this is a `-remote` variant
    pub fn is_remote_variant(&self) -> bool {
        matches!(
            self,
            Commands::ImportKeyRemote(_)
                | Commands::DeployRemote(_)
                | Commands::StatusRemote(_)
                | Commands::DeployMyFamilyRemote(_)
                | Commands::RemoveRemote(_)
        )
    }

    /// Targeting flags, for every subcommand that has them
    pub fn targets(&self) -> Option<&TargetArgs> {
        match self {
            Commands::Generate(_) => None,
            Commands::ImportKey(a) | Commands::ImportKeyRemote(a) => Some(&a.targets),
            Commands::Deploy(a) | Commands::DeployRemote(a) => Some(&a.targets),
            Commands::Status(a) | Commands::StatusRemote(a) => Some(&a.targets),
            Commands::CollectFingerprints(a) => Some(&a.targets),
            Commands::DeployMyFamily(a) | Commands::DeployMyFamilyRemote(a) => Some(&a.targets),
            Commands::Remove(a) | Commands::RemoveRemote(a) => Some(&a.targets),
        }
    }
}

impl Cli {
    /// Cross-argument checks clap cannot express on shared argument groups
    pub fn validate(&self) -> Result<(), clap::Error> {
        use clap::CommandFactory;

        let missing_target = self.command.is_remote_variant()
            && !self.command.targets().is_some_and(TargetArgs::has_remote);
        if missing_target {
            return Err(Cli::command().error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "the -remote subcommands need --remote HOST or --servers FILE",
            ));
        }
        Ok(())
    }
}
