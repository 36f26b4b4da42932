//! Credential transport planning
//!
//! Decides which key directories receive the credential and how the bytes
//! travel. The install itself runs inside the host's apply procedure.

use std::path::PathBuf;

use crate::domain::entities::{
    Credential, CredentialSource, HostSnapshot, InstanceSnapshot, KeyDestination, KeyInstall,
};
use crate::domain::value_objects::FleetLayout;

/// Plan installing `credential` into every enumerated instance.
///
/// Instances already holding an identical key file are skipped. A local host
/// reads the operator's file directly; a remote host gets the bytes inline.
pub fn plan_install(
    credential: &Credential,
    snapshot: &HostSnapshot,
    layout: &FleetLayout,
    remote: bool,
) -> KeyInstall {
    let destinations = snapshot
        .instances
        .iter()
        .filter(|snap| !snap.has_key(credential.file_name(), credential.sha256()))
        .map(|snap| KeyDestination {
            instance: snap.name().to_string(),
            key_dir: snap.instance.key_dir.clone(),
            owner: layout.owner(snap.name()),
            group: layout.group(snap.name()),
        })
        .collect();

    let source = if remote {
        CredentialSource::Inline(credential.bytes().to_vec())
    } else {
        CredentialSource::LocalPath(credential.path().to_path_buf())
    };

    KeyInstall {
        source,
        file_name: credential.file_name().to_string(),
        sha256: credential.sha256().to_string(),
        destinations,
    }
}

/// Key directories holding family keys that `remove --purge-key` deletes
pub fn plan_purge(snapshot: &HostSnapshot) -> Vec<(String, PathBuf)> {
    snapshot
        .instances
        .iter()
        .filter(|snap| !snap.keys.is_empty())
        .map(|snap: &InstanceSnapshot| (snap.name().to_string(), snap.instance.key_dir.clone()))
        .collect()
}
