//! Read-only reports: per-instance status and fingerprint collection.
//!
//! `FamilyId` and `MyFamily` are maintained independently; divergence between
//! them is reported here and never repaired.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::domain::entities::{
    parse_my_family, Credential, FingerprintEntry, HostSnapshot, InstanceSnapshot, InstanceStatus,
};
use crate::domain::services::{directive_values, include_targets};
use crate::domain::value_objects::{FAMILY_ID_DIRECTIVE, MY_FAMILY_DIRECTIVE};

/// Status of every instance on one host, plus host-level notes
pub fn host_status(
    snapshot: &HostSnapshot,
    shared: Option<&Path>,
    credential: Option<&Credential>,
    fleet_fingerprints: &BTreeSet<String>,
) -> (Vec<InstanceStatus>, Vec<String>) {
    let statuses: Vec<InstanceStatus> = snapshot
        .instances
        .iter()
        .map(|snap| instance_status(snap, snapshot, shared, credential, fleet_fingerprints))
        .collect();

    let ids: BTreeSet<&str> = statuses
        .iter()
        .filter_map(|s| s.family_id.as_deref())
        .collect();
    let mut notes = Vec::new();
    if ids.len() > 1 {
        notes.push(format!(
            "instances disagree on FamilyId: {}",
            ids.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    if let Some(path) = shared {
        notes.push(format!("instances share {}", path.display()));
    }

    (statuses, notes)
}

fn instance_status(
    snap: &InstanceSnapshot,
    snapshot: &HostSnapshot,
    shared: Option<&Path>,
    credential: Option<&Credential>,
    fleet_fingerprints: &BTreeSet<String>,
) -> InstanceStatus {
    let mut warnings = Vec::new();

    let family = effective(snap, snapshot, FAMILY_ID_DIRECTIVE);
    let my_family = effective(snap, snapshot, MY_FAMILY_DIRECTIVE);
    let listed: BTreeSet<String> = my_family
        .as_ref()
        .map(|(value, _)| parse_my_family(value).into_iter().collect())
        .unwrap_or_default();

    let key_installed = !snap.keys.is_empty();
    let key_matches = credential.map(|c| snap.has_key(c.file_name(), c.sha256()));

    if snap.config.is_none() {
        warnings.push(format!(
            "config unreadable: {}",
            snap.instance.config_path.display()
        ));
    }
    match (&family, key_installed) {
        (Some(_), false) => warnings.push("FamilyId set but no family key installed".to_string()),
        (None, true) => warnings.push("family key installed but FamilyId not set".to_string()),
        _ => {}
    }
    if key_matches == Some(false) && key_installed {
        warnings.push("installed family key differs from the given credential".to_string());
    }
    match (&family, &my_family) {
        (Some(_), None) => warnings.push("FamilyId set without MyFamily".to_string()),
        (None, Some(_)) => warnings.push("MyFamily set without FamilyId".to_string()),
        _ => {}
    }
    if my_family.is_some() {
        let own = snap.fingerprint.as_ref().map(|f| f.fingerprint.as_str());
        let missing = fleet_fingerprints
            .iter()
            .filter(|fp| Some(fp.as_str()) != own && !listed.contains(*fp))
            .count();
        if missing > 0 {
            warnings.push(format!(
                "MyFamily is missing {} fleet fingerprint(s)",
                missing
            ));
        }
    }
    if let (Some(path), Some(config)) = (shared, snap.config.as_deref()) {
        for name in [FAMILY_ID_DIRECTIVE, MY_FAMILY_DIRECTIVE] {
            if !directive_values(config, name).is_empty() {
                warnings.push(format!(
                    "declares {} in its own config while sharing {}",
                    name,
                    path.display()
                ));
            }
        }
    }

    InstanceStatus {
        name: snap.name().to_string(),
        running: snap.instance.running,
        key_installed,
        key_matches,
        family_id_origin: family.as_ref().map(|(_, origin)| origin.clone()),
        family_id: family.map(|(value, _)| value),
        my_family: my_family.map(|_| listed.len()),
        fingerprint: snap.fingerprint.as_ref().map(|f| f.fingerprint.clone()),
        warnings,
    }
}

/// First value of `name` in the instance's own config, else in what it includes
fn effective(
    snap: &InstanceSnapshot,
    snapshot: &HostSnapshot,
    name: &str,
) -> Option<(String, PathBuf)> {
    let config = snap.config.as_deref()?;
    if let Some(value) = directive_values(config, name).into_iter().next() {
        return Some((value, snap.instance.config_path.clone()));
    }
    include_targets(config).into_iter().find_map(|include| {
        let content = snapshot.included_content(&include)?;
        let value = directive_values(content, name).into_iter().next()?;
        Some((value, include))
    })
}

/// Fingerprints of every instance that has one
pub fn collect_fingerprints(snapshot: &HostSnapshot) -> Vec<FingerprintEntry> {
    snapshot
        .instances
        .iter()
        .filter_map(|snap| {
            let fp = snap.fingerprint.as_ref()?;
            Some(FingerprintEntry {
                instance: snap.name().to_string(),
                nickname: fp.nickname.clone(),
                fingerprint: fp.fingerprint.clone(),
            })
        })
        .collect()
}
