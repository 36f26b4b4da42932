//! Rollout Use Case
//!
//! Drives one operation across every target:
//! 1. Negotiate privileges
//! 2. Enumerate instances
//! 3. Plan and apply the host's changes in one call
//! 4. Reload the touched, running instances
//!
//! Targets are processed one after another. A failure on one target is
//! recorded in its outcome and the batch continues; only invocation-wide
//! errors (an unresolvable FamilyId, for example) abort.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::domain::entities::{
    my_family_line, Credential, HostSnapshot, OutcomeStatus, RelayFingerprint, RolloutOutcome,
};
use crate::domain::ports::{
    HostShell, IdentifierDeriver, NoopEventSink, Phase, RolloutEvent, RolloutEventSink,
    ServiceAction,
};
use crate::domain::services::{
    detect_shared_config, enumerate_instances, negotiate, reload_touched, resolve_identifier,
    Negotiated, ResolvedIdentifier,
};
use crate::domain::value_objects::Target;
use crate::error::RolloutResult;

use super::options::{Operation, RolloutContext};
use super::planner::{plan_host, PlanInputs};
use super::result::FleetSummary;
use super::status::{collect_fingerprints, host_status};

/// One host the rollout runs against
pub struct RolloutHost {
    pub shell: Box<dyn HostShell>,
    /// The remote target behind `shell`; `None` for the local host
    pub target: Option<Target>,
}

impl RolloutHost {
    pub fn new(shell: Box<dyn HostShell>, target: Option<Target>) -> Self {
        Self { shell, target }
    }

    pub fn label(&self) -> String {
        self.shell.label()
    }
}

/// A host after negotiation and enumeration
struct Surveyed {
    negotiated: Negotiated,
    snapshot: HostSnapshot,
}

/// Values fixed for the whole invocation once the survey and the first
/// enumeration are done
#[derive(Default)]
struct FleetState {
    identifier: Option<ResolvedIdentifier>,
    my_family: Option<String>,
    fingerprints: BTreeSet<String>,
}

/// Rollout use case - runs one operation across the fleet
pub struct RolloutUseCase {
    deriver: Box<dyn IdentifierDeriver>,
    events: Arc<dyn RolloutEventSink>,
    interrupted: Arc<AtomicBool>,
}

impl RolloutUseCase {
    pub fn new(deriver: Box<dyn IdentifierDeriver>) -> Self {
        Self {
            deriver,
            events: Arc::new(NoopEventSink),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn RolloutEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Flag checked before each target; once set, remaining targets are skipped
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = interrupted;
        self
    }

    /// Run `operation` against `hosts`.
    ///
    /// Returns `Err` only for invocation-wide failures.
    pub fn execute(
        &self,
        ctx: &RolloutContext,
        operation: Operation,
        credential: Option<&Credential>,
        hosts: &[RolloutHost],
    ) -> RolloutResult<FleetSummary> {
        let started_at = Utc::now();
        let total = hosts.len();
        tracing::info!(
            operation = operation.name(),
            topology = ctx.topology.as_str(),
            targets = total,
            dry_run = ctx.dry_run,
            "starting rollout"
        );

        let mut state = FleetState::default();
        if let Some(explicit) = ctx.family_id.as_deref() {
            if operation.needs_identifier() {
                state.identifier = Some(resolve_identifier(
                    Some(explicit),
                    None,
                    None,
                    credential,
                    self.deriver.as_ref(),
                )?);
            }
        }

        let mut surveyed: Vec<Option<RolloutResult<Surveyed>>> =
            hosts.iter().map(|_| None).collect();
        if operation.needs_fleet_survey() {
            self.survey(ctx, hosts, &mut surveyed, &mut state);
        }

        let mut outcomes = Vec::with_capacity(total);
        for (index, host) in hosts.iter().enumerate() {
            let label = host.label();
            if self.interrupted.load(Ordering::SeqCst) {
                let mut outcome = RolloutOutcome::new(label, OutcomeStatus::Skipped);
                outcome.notes.push("interrupted before this target started".to_string());
                self.finish(index, total, outcome, &mut outcomes);
                continue;
            }

            self.events.on_event(RolloutEvent::TargetStarted {
                index,
                total,
                target: &label,
            });

            let cached = surveyed[index].take();
            let outcome = match self.run_target(ctx, operation, credential, host, cached, &mut state)
            {
                Ok(outcome) => outcome,
                Err(err) if err.is_invocation_fatal() => return Err(err),
                Err(err) => {
                    tracing::warn!(host = %label, error = %err, "target failed");
                    RolloutOutcome::failed(label, err)
                }
            };
            self.finish(index, total, outcome, &mut outcomes);
        }

        let mut summary =
            FleetSummary::new(operation.name(), ctx.topology, ctx.dry_run, started_at, outcomes);
        if let Some(resolved) = state.identifier {
            summary.family_id = Some(resolved.id.to_string());
            summary.family_id_source = Some(resolved.source.to_string());
        }
        tracing::info!(
            ok = summary.totals.ok,
            failed = summary.totals.failed,
            noop = summary.totals.noop,
            skipped = summary.totals.skipped,
            "rollout finished"
        );
        Ok(summary)
    }

    fn finish(
        &self,
        index: usize,
        total: usize,
        outcome: RolloutOutcome,
        outcomes: &mut Vec<RolloutOutcome>,
    ) {
        self.events.on_event(RolloutEvent::TargetFinished {
            index,
            total,
            outcome: &outcome,
        });
        outcomes.push(outcome);
    }

    /// First pass: enumerate every target and collect fleet-wide fingerprints
    fn survey(
        &self,
        ctx: &RolloutContext,
        hosts: &[RolloutHost],
        surveyed: &mut [Option<RolloutResult<Surveyed>>],
        state: &mut FleetState,
    ) {
        let mut fingerprints: Vec<RelayFingerprint> = Vec::new();
        for (host, slot) in hosts.iter().zip(surveyed.iter_mut()) {
            if self.interrupted.load(Ordering::SeqCst) {
                break;
            }
            let result = self.negotiate_and_enumerate(ctx, host);
            if let Ok(found) = &result {
                fingerprints.extend(
                    found
                        .snapshot
                        .instances
                        .iter()
                        .filter_map(|snap| snap.fingerprint.clone()),
                );
            }
            *slot = Some(result);
        }

        state.fingerprints = fingerprints.iter().map(|f| f.fingerprint.clone()).collect();
        state.my_family = my_family_line(&fingerprints);
        tracing::debug!(count = state.fingerprints.len(), "collected fleet fingerprints");
    }

    fn negotiate_and_enumerate(
        &self,
        ctx: &RolloutContext,
        host: &RolloutHost,
    ) -> RolloutResult<Surveyed> {
        let label = host.label();
        let shell = host.shell.as_ref();

        self.phase(&label, Phase::Negotiating);
        let negotiated = negotiate(shell, &ctx.privilege, host.target.as_ref())?;

        self.phase(&label, Phase::Enumerating);
        let snapshot = enumerate_instances(shell, negotiated.elevation, &ctx.layout, &ctx.instances)?;

        Ok(Surveyed {
            negotiated,
            snapshot,
        })
    }

    fn phase(&self, target: &str, phase: Phase) {
        tracing::debug!(host = %target, phase = phase.as_str(), "entering phase");
        self.events.on_event(RolloutEvent::PhaseEntered { target, phase });
    }

    fn run_target(
        &self,
        ctx: &RolloutContext,
        operation: Operation,
        credential: Option<&Credential>,
        host: &RolloutHost,
        cached: Option<RolloutResult<Surveyed>>,
        state: &mut FleetState,
    ) -> RolloutResult<RolloutOutcome> {
        let label = host.label();
        let Surveyed {
            negotiated,
            snapshot,
        } = match cached {
            Some(result) => result?,
            None => self.negotiate_and_enumerate(ctx, host)?,
        };

        if snapshot.is_empty() {
            let mut outcome = RolloutOutcome::new(label, OutcomeStatus::Noop);
            outcome.notes.push("no instances found".to_string());
            return Ok(outcome);
        }

        let shared = detect_shared_config(&snapshot);
        if let Some(path) = &shared {
            tracing::debug!(host = %label, shared = %path.display(), "instances share one config");
        }

        match operation {
            Operation::Status => {
                let (instances, notes) =
                    host_status(&snapshot, shared.as_deref(), credential, &state.fingerprints);
                let mut outcome = RolloutOutcome::new(label, OutcomeStatus::Ok);
                outcome.instances = instances;
                outcome.notes = notes;
                return Ok(outcome);
            }
            Operation::CollectFingerprints => {
                let mut outcome = RolloutOutcome::new(label, OutcomeStatus::Ok);
                outcome.fingerprints = collect_fingerprints(&snapshot);
                if outcome.fingerprints.is_empty() {
                    outcome.status = OutcomeStatus::Noop;
                    outcome.notes.push("no fingerprints found".to_string());
                }
                return Ok(outcome);
            }
            _ => {}
        }

        if operation.needs_identifier() && state.identifier.is_none() {
            let resolved = resolve_identifier(
                None,
                Some(&snapshot),
                shared.as_deref(),
                credential,
                self.deriver.as_ref(),
            )?;
            tracing::info!(family_id = %resolved.id, source = %resolved.source, "resolved FamilyId");
            state.identifier = Some(resolved);
        }

        let inputs = PlanInputs {
            operation,
            family_id: state.identifier.as_ref().map(|r| &r.id),
            my_family: state.my_family.as_deref(),
            credential,
            layout: &ctx.layout,
            remote: ctx.is_remote(),
        };
        let plan = plan_host(&label, &snapshot, shared.as_deref(), &inputs)?;

        let mut outcome = RolloutOutcome::new(label.clone(), OutcomeStatus::Ok);
        outcome.notes = plan.notes;
        if needs_fingerprints(operation) && state.my_family.is_none() {
            outcome
                .notes
                .push("no relay fingerprints found across the fleet, MyFamily left unchanged".to_string());
        }

        if plan.apply.is_empty() {
            outcome.status = OutcomeStatus::Noop;
            return Ok(outcome);
        }

        outcome.changes = plan.changes;
        outcome.instances_touched = plan.touched.len();
        if ctx.dry_run {
            tracing::info!(host = %label, changes = outcome.changes.len(), "dry run, nothing written");
            return Ok(outcome);
        }

        self.phase(&label, Phase::Mutating);
        let report = host.shell.apply(negotiated.elevation, &plan.apply)?;
        tracing::info!(
            host = %label,
            written = report.written.len(),
            installed = report.installed.len(),
            purged = report.purged.len(),
            "changes applied"
        );

        if ctx.reload_enabled() {
            self.phase(&label, Phase::Reloading);
            let units: Vec<String> = snapshot
                .instances
                .iter()
                .filter(|snap| plan.touched.contains(snap.name()))
                .map(|snap| snap.instance.unit.clone())
                .collect();
            let reloaded = reload_touched(host.shell.as_ref(), negotiated.elevation, &units)?;
            outcome.reloaded = reloaded.units.len();
            if let Some(action) = reloaded.action {
                if action != ServiceAction::Reload {
                    outcome
                        .notes
                        .push(format!("reload failed, {} succeeded", action.as_str()));
                }
            }
        }

        Ok(outcome)
    }
}

fn needs_fingerprints(operation: Operation) -> bool {
    matches!(
        operation,
        Operation::DeployMyFamily
            | Operation::Deploy {
                legacy_family: true
            }
    )
}

