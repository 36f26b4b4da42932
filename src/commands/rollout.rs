//! Rollout command handler
//!
//! Shared by every subcommand that runs across the fleet: resolves targets
//! and the topology, loads the credential, runs the use case and renders the
//! summary.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use relayctl::application::{FleetSummary, Operation, RolloutContext};
use relayctl::domain::entities::Credential;
use relayctl::domain::services::PrivilegePolicy;
use relayctl::domain::value_objects::{
    load_target_list, select_topology, ResolvedTargets, Target, TargetOverrides, TargetSelection,
};
use relayctl::error::RolloutError;
use relayctl::presentation::cli::{RunArgs, TargetArgs};
use relayctl::presentation::output::{fingerprint_listing, render_summary, summary_json};
use relayctl::presentation::{
    create_event_sink, create_hosts, create_rollout_use_case, OutputFormat, TextStyle,
};

use super::{load_config, terminal_attached, use_color, GlobalArgs};

/// One fleet-wide invocation, assembled from a subcommand's arguments
#[derive(Debug, Clone)]
pub struct RolloutRequest<'a> {
    pub operation: Operation,
    pub targets: &'a TargetArgs,
    pub run: RunArgs,
    pub key: Option<&'a Path>,
    pub family_id: Option<String>,
    /// Skip the confirmation `remove` asks for on a terminal
    pub assume_yes: bool,
    /// Where `collect-fingerprints` also writes its listing
    pub output: Option<PathBuf>,
}

impl<'a> RolloutRequest<'a> {
    pub fn new(operation: Operation, targets: &'a TargetArgs) -> Self {
        Self {
            operation,
            targets,
            run: RunArgs::default(),
            key: None,
            family_id: None,
            assume_yes: false,
            output: None,
        }
    }
}

/// Execute a rollout subcommand
pub fn cmd_rollout(globals: &GlobalArgs<'_>, request: RolloutRequest<'_>) -> Result<()> {
    let config = load_config(globals)?;
    let terminal = terminal_attached();
    let resolved = resolve_targets(request.targets, terminal)?;

    let credential = match request.key {
        Some(path) => Some(
            Credential::load(path)
                .with_context(|| format!("Failed to load family key {}", path.display()))?,
        ),
        None => None,
    };
    if request.operation.needs_credential() && credential.is_none() {
        bail!("{} needs --key", request.operation.name());
    }

    let privilege = PrivilegePolicy {
        topology: resolved.topology,
        terminal_attached: terminal,
        allow_unprivileged: config.privilege.allow_unprivileged,
    };
    let ctx = RolloutContext::new(resolved.topology, privilege)
        .with_layout(config.layout.clone())
        .with_dry_run(request.run.dry_run)
        .with_no_reload(request.run.no_reload || !config.reload.enabled)
        .with_family_id(request.family_id.clone())
        .with_instances(request.targets.instances.clone())
        .with_verbosity(globals.verbose);

    if matches!(request.operation, Operation::Remove { .. })
        && !confirm_remove(&request, &resolved, terminal, globals.json)?
    {
        println!("Aborted.");
        return Ok(());
    }

    let format = OutputFormat::from_flag(globals.json);
    let style = TextStyle {
        color: use_color(globals.json),
        verbose: globals.verbose,
        dry_run: ctx.dry_run,
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(err) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        tracing::warn!(error = %err, "cannot install Ctrl+C handler");
    }

    let events = create_event_sink(format, style);
    let use_case = create_rollout_use_case(&config, events, interrupted);
    let hosts = create_hosts(&resolved, &config);

    let summary = use_case
        .execute(&ctx, request.operation, credential.as_ref(), &hosts)
        .with_context(|| format!("{} aborted", request.operation.name()))?;

    render(&summary, format, &style);

    if let Some(path) = &request.output {
        std::fs::write(path, fingerprint_listing(&summary))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !globals.json {
            eprintln!("Wrote fingerprints to {}", path.display());
        }
    }

    Ok(())
}

fn resolve_targets(args: &TargetArgs, terminal: bool) -> Result<ResolvedTargets> {
    let overrides = TargetOverrides {
        user: args.user.clone(),
        port: args.port,
    };

    let selection = if let Some(descriptor) = &args.remote {
        match Target::parse(descriptor, &overrides)? {
            Some(target) => TargetSelection::Single(target),
            None => {
                return Err(RolloutError::MalformedTarget {
                    input: descriptor.clone(),
                    reason: "missing host".to_string(),
                }
                .into())
            }
        }
    } else if let Some(path) = &args.servers {
        let targets = load_target_list(path, &overrides)
            .with_context(|| format!("Failed to read target list {}", path.display()))?;
        if targets.is_empty() {
            bail!("target list {} names no hosts", path.display());
        }
        TargetSelection::List(targets)
    } else {
        TargetSelection::None
    };

    let resolved = select_topology(selection, terminal);
    tracing::debug!(
        topology = resolved.topology.as_str(),
        targets = resolved.targets.len(),
        "selected topology"
    );
    Ok(resolved)
}

/// Ask before removing, unless told not to or nobody can answer
fn confirm_remove(
    request: &RolloutRequest<'_>,
    resolved: &ResolvedTargets,
    terminal: bool,
    json: bool,
) -> Result<bool> {
    if request.assume_yes || request.run.dry_run || !terminal || json {
        return Ok(true);
    }

    let scope = match resolved.targets.len() {
        0 => "this host".to_string(),
        1 => resolved.targets[0].to_string(),
        n => format!("{} hosts", n),
    };
    let what = match request.operation {
        Operation::Remove {
            legacy_family: true,
            purge_key: true,
        } => "FamilyId, MyFamily and installed family keys",
        Operation::Remove {
            legacy_family: true,
            ..
        } => "FamilyId and MyFamily",
        Operation::Remove {
            purge_key: true, ..
        } => "FamilyId and installed family keys",
        _ => "FamilyId",
    };

    use dialoguer::Confirm;
    let confirmed = Confirm::new()
        .with_prompt(format!("Remove {} on {}?", what, scope))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn render(summary: &FleetSummary, format: OutputFormat, style: &TextStyle) {
    match format {
        OutputFormat::Json => println!("{}", summary_json(summary)),
        OutputFormat::Text => print!("{}", render_summary(summary, style)),
    }
}
