//! Host Planner
//!
//! Turns one host's snapshot into the writes, key installs and purges an
//! operation needs. Planning is pure: nothing here touches a host.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::domain::entities::{
    ApplyPlan, Credential, FileWrite, HostSnapshot, InstanceSnapshot, PlannedChange,
};
use crate::domain::services::{
    apply_all, directive_values, include_targets, partially_shared_config, plan_install,
    plan_purge, DirectiveEdit,
};
use crate::domain::value_objects::{FamilyId, FleetLayout, FAMILY_ID_DIRECTIVE, MY_FAMILY_DIRECTIVE};
use crate::error::{RolloutError, RolloutResult};

use super::options::Operation;

/// Inputs that are the same for every host of one invocation
#[derive(Debug, Clone, Copy)]
pub struct PlanInputs<'a> {
    pub operation: Operation,
    pub family_id: Option<&'a FamilyId>,
    /// Fleet-wide `MyFamily` line, when fingerprints were collected
    pub my_family: Option<&'a str>,
    pub credential: Option<&'a Credential>,
    pub layout: &'a FleetLayout,
    pub remote: bool,
}

/// Everything one host will receive
#[derive(Debug, Clone, Default)]
pub struct HostPlan {
    pub apply: ApplyPlan,
    pub changes: Vec<PlannedChange>,
    /// Instances whose effective configuration or keys change
    pub touched: BTreeSet<String>,
    pub notes: Vec<String>,
}

impl HostPlan {
    pub fn is_empty(&self) -> bool {
        self.apply.is_empty()
    }
}

/// Directive edits an operation applies to every config it owns
pub fn directive_edits(inputs: &PlanInputs<'_>) -> Vec<DirectiveEdit> {
    let mut edits = Vec::new();
    match inputs.operation {
        Operation::Deploy { legacy_family } => {
            if let Some(id) = inputs.family_id {
                edits.push(DirectiveEdit::upsert(FAMILY_ID_DIRECTIVE, id.directive_line()));
            }
            if legacy_family {
                if let Some(line) = inputs.my_family {
                    edits.push(DirectiveEdit::upsert(MY_FAMILY_DIRECTIVE, line));
                }
            }
        }
        Operation::DeployMyFamily => {
            if let Some(line) = inputs.my_family {
                edits.push(DirectiveEdit::upsert(MY_FAMILY_DIRECTIVE, line));
            }
        }
        Operation::Remove { legacy_family, .. } => {
            edits.push(DirectiveEdit::remove(FAMILY_ID_DIRECTIVE));
            if legacy_family {
                edits.push(DirectiveEdit::remove(MY_FAMILY_DIRECTIVE));
            }
        }
        Operation::ImportKey | Operation::Status | Operation::CollectFingerprints => {}
    }
    edits
}

/// Plan one host.
///
/// `shared` is the detected shared config. When it is set, only that file is
/// edited. Otherwise instances edit their own configs, except that a file
/// delegated to by two or more instances, while every other instance has no
/// include, is still edited once for that group. Includes that disagree are
/// left untouched. An unreadable instance config fails the whole host before
/// anything is written.
pub fn plan_host(
    host: &str,
    snapshot: &HostSnapshot,
    shared: Option<&Path>,
    inputs: &PlanInputs<'_>,
) -> RolloutResult<HostPlan> {
    let mut plan = HostPlan::default();
    let edits = directive_edits(inputs);

    if !edits.is_empty() {
        plan_configs(host, &mut plan, snapshot, shared, &edits)?;
    }

    match inputs.operation {
        Operation::ImportKey | Operation::Deploy { .. } => {
            if let Some(credential) = inputs.credential {
                let install = plan_install(credential, snapshot, inputs.layout, inputs.remote);
                for dest in &install.destinations {
                    plan.touched.insert(dest.instance.clone());
                    plan.changes.push(PlannedChange::KeyInstall {
                        instance: dest.instance.clone(),
                        key_dir: dest.key_dir.clone(),
                    });
                }
                if !install.destinations.is_empty() {
                    plan.apply.install = Some(install);
                }
            }
        }
        Operation::Remove {
            purge_key: true, ..
        } => {
            for (instance, key_dir) in plan_purge(snapshot) {
                plan.touched.insert(instance.clone());
                plan.apply.purge.push(key_dir.clone());
                plan.changes.push(PlannedChange::KeyPurge { instance, key_dir });
            }
        }
        _ => {}
    }

    Ok(plan)
}

/// The delegated file and the instances whose only include it is
fn delegation<'s>(
    snapshot: &'s HostSnapshot,
    shared: Option<&Path>,
) -> Option<(PathBuf, Vec<&'s InstanceSnapshot>)> {
    let path = match shared {
        Some(path) => path.to_path_buf(),
        None => partially_shared_config(snapshot)?,
    };
    let members = snapshot
        .instances
        .iter()
        .filter(|snap| {
            snap.config
                .as_deref()
                .is_some_and(|config| include_targets(config) == std::slice::from_ref(&path))
        })
        .collect();
    Some((path, members))
}

fn plan_configs(
    host: &str,
    plan: &mut HostPlan,
    snapshot: &HostSnapshot,
    shared: Option<&Path>,
    edits: &[DirectiveEdit],
) -> RolloutResult<()> {
    if let Some(unreadable) = snapshot.instances.iter().find(|s| s.config.is_none()) {
        return Err(RolloutError::MutationFailed {
            target: host.to_string(),
            message: format!(
                "config of {} is unreadable: {}",
                unreadable.name(),
                unreadable.instance.config_path.display()
            ),
        });
    }

    let mut delegated: BTreeSet<&str> = BTreeSet::new();

    if let Some((path, members)) = delegation(snapshot, shared) {
        let path = &path;
        let before = snapshot.included_content(path).unwrap_or_default();
        let after = apply_all(before, edits);
        let names: Vec<String> = members.iter().map(|m| m.name().to_string()).collect();

        if after != before {
            plan.apply.writes.push(FileWrite {
                path: path.clone(),
                content: after.clone(),
            });
            plan.changes.push(PlannedChange::ConfigEdit {
                path: path.clone(),
                directives: edit_names(edits),
                instances: names.clone(),
                before: before.to_string(),
                after,
            });
            plan.touched.extend(names);
        }

        for snap in &members {
            delegated.insert(snap.name());
            let own = snap.config.as_deref().unwrap_or_default();
            for name in declared(own, edits) {
                plan.notes.push(format!(
                    "{} declares {} in its own config, left unchanged (shared file is {})",
                    snap.name(),
                    name,
                    path.display()
                ));
            }
        }
    }

    for snap in &snapshot.instances {
        if delegated.contains(snap.name()) {
            continue;
        }
        let before = snap.config.as_deref().unwrap_or_default();
        let after = apply_all(before, edits);
        if after != before {
            plan.apply.writes.push(FileWrite {
                path: snap.instance.config_path.clone(),
                content: after.clone(),
            });
            plan.changes.push(PlannedChange::ConfigEdit {
                path: snap.instance.config_path.clone(),
                directives: edit_names(edits),
                instances: vec![snap.name().to_string()],
                before: before.to_string(),
                after,
            });
            plan.touched.insert(snap.name().to_string());
        }

        for include in include_targets(before) {
            if let Some(content) = snapshot.included_content(&include) {
                for name in declared(content, edits) {
                    plan.notes.push(format!(
                        "{} includes {} which also declares {}, left unchanged",
                        snap.name(),
                        include.display(),
                        name
                    ));
                }
            }
        }
    }
    Ok(())
}

fn edit_names(edits: &[DirectiveEdit]) -> Vec<String> {
    edits.iter().map(|e| e.name().to_string()).collect()
}

/// Edited directive names that `text` declares
fn declared<'e>(text: &str, edits: &'e [DirectiveEdit]) -> Vec<&'e str> {
    edits
        .iter()
        .map(DirectiveEdit::name)
        .filter(|name| !directive_values(text, name).is_empty())
        .collect()
}
