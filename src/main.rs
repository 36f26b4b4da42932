//! relayctl CLI
//!
//! Usage: relayctl <COMMAND>
//!
//! Commands:
//!   generate               Generate a family key
//!   import-key[-remote]    Install the family key
//!   deploy[-remote]        Install the key and set FamilyId
//!   status[-remote]        Report per-instance family state
//!   collect-fingerprints   List relay fingerprints
//!   deploy-myfamily[-remote]  Set MyFamily from the fleet's fingerprints
//!   remove[-remote]        Remove FamilyId

mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relayctl::application::Operation;
use relayctl::presentation::cli::{Cli, Commands};

use commands::generate::cmd_generate;
use commands::rollout::{cmd_rollout, RolloutRequest};
use commands::GlobalArgs;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "RELAYCTL_LOG";

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(err) = cli.validate() {
        err.exit();
    }

    init_tracing(cli.verbose);

    let globals = GlobalArgs {
        json: cli.json,
        verbose: cli.verbose,
        config: cli.config.as_deref(),
    };

    match &cli.command {
        Commands::Generate(args) => cmd_generate(&globals, args),

        Commands::ImportKey(args) | Commands::ImportKeyRemote(args) => {
            let mut request = RolloutRequest::new(Operation::ImportKey, &args.targets);
            request.run = args.run.clone();
            request.key = Some(args.key.as_path());
            cmd_rollout(&globals, request)
        }

        Commands::Deploy(args) | Commands::DeployRemote(args) => {
            let operation = Operation::Deploy {
                legacy_family: args.legacy_family,
            };
            let mut request = RolloutRequest::new(operation, &args.targets);
            request.run = args.run.clone();
            request.key = Some(args.key.as_path());
            request.family_id = args.family_id.clone();
            cmd_rollout(&globals, request)
        }

        Commands::Status(args) | Commands::StatusRemote(args) => {
            let mut request = RolloutRequest::new(Operation::Status, &args.targets);
            request.key = args.key.as_deref();
            cmd_rollout(&globals, request)
        }

        Commands::CollectFingerprints(args) => {
            let mut request = RolloutRequest::new(Operation::CollectFingerprints, &args.targets);
            request.output = args.output.clone();
            cmd_rollout(&globals, request)
        }

        Commands::DeployMyFamily(args) | Commands::DeployMyFamilyRemote(args) => {
            let mut request = RolloutRequest::new(Operation::DeployMyFamily, &args.targets);
            request.run = args.run.clone();
            cmd_rollout(&globals, request)
        }

        Commands::Remove(args) | Commands::RemoveRemote(args) => {
            let operation = Operation::Remove {
                legacy_family: args.legacy_family,
                purge_key: args.purge_key,
            };
            let mut request = RolloutRequest::new(operation, &args.targets);
            request.run = args.run.clone();
            request.assume_yes = args.yes;
            cmd_rollout(&globals, request)
        }
    }
}

/// Logs go to stderr; stdout carries only the report
fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "relayctl=warn",
        1 => "relayctl=info",
        _ => "relayctl=debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| fallback.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
