//! Instance enumeration
//!
//! Turns the raw records a host reports into validated instance snapshots and
//! fetches every file those instances `%include`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::domain::entities::{HostSnapshot, Instance, InstanceSnapshot, RelayFingerprint};
use crate::domain::ports::{Elevation, HostShell};
use crate::domain::value_objects::{is_valid_instance_name, FleetLayout};
use crate::error::RolloutResult;

use super::shared_config::include_targets;

/// List every instance on the host behind `shell`.
///
/// A missing or empty registry yields an empty snapshot, not an error.
/// A non-empty `only` restricts the result to the named instances.
pub fn enumerate_instances(
    shell: &dyn HostShell,
    elevation: Elevation,
    layout: &FleetLayout,
    only: &[String],
) -> RolloutResult<HostSnapshot> {
    let records = shell.snapshot(elevation, layout)?;

    let mut instances: Vec<InstanceSnapshot> = records
        .into_iter()
        .filter(|record| {
            let valid = is_valid_instance_name(&record.name);
            if !valid {
                tracing::warn!(host = %shell.label(), name = %record.name, "skipping instance with unusable name");
            }
            valid
        })
        .filter(|record| only.is_empty() || only.iter().any(|n| n == &record.name))
        .map(|record| InstanceSnapshot {
            instance: Instance {
                config_path: layout.config_path(&record.name),
                key_dir: layout.key_dir(&record.name),
                unit: layout.unit(&record.name),
                running: record.active,
                name: record.name,
            },
            fingerprint: record.fingerprint.as_deref().and_then(RelayFingerprint::parse),
            config: record.config,
            keys: record.keys,
        })
        .collect();
    instances.sort_by(|a, b| a.instance.name.cmp(&b.instance.name));

    for wanted in only {
        if !instances.iter().any(|i| i.name() == wanted) {
            tracing::warn!(host = %shell.label(), instance = %wanted, "requested instance not found");
        }
    }

    let includes: BTreeSet<PathBuf> = instances
        .iter()
        .filter_map(|i| i.config.as_deref())
        .flat_map(include_targets)
        .collect();

    let included = if includes.is_empty() {
        Default::default()
    } else {
        let paths: Vec<PathBuf> = includes.into_iter().collect();
        shell.read_files(elevation, &paths)?.into_iter().collect()
    };

    tracing::debug!(host = %shell.label(), count = instances.len(), "enumerated instances");

    Ok(HostSnapshot {
        instances,
        included,
    })
}
