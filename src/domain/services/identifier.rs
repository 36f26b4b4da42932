//! FamilyId resolution
//!
//! One identifier is authoritative for a whole invocation. It comes from the
//! operator, from a config already carrying one, or from the credential.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::entities::{Credential, HostSnapshot};
use crate::domain::ports::IdentifierDeriver;
use crate::domain::value_objects::{FamilyId, FAMILY_ID_DIRECTIVE};
use crate::error::{RolloutError, RolloutResult};

use super::mutator::directive_values;

/// Where the resolved identifier came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierSource {
    Explicit,
    SharedConfig(PathBuf),
    InstanceConfig { instance: String, path: PathBuf },
    Derived,
}

impl fmt::Display for IdentifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierSource::Explicit => f.write_str("--family-id"),
            IdentifierSource::SharedConfig(path) => write!(f, "{}", path.display()),
            IdentifierSource::InstanceConfig { instance, path } => {
                write!(f, "{} ({})", path.display(), instance)
            }
            IdentifierSource::Derived => f.write_str("credential"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentifier {
    pub id: FamilyId,
    pub source: IdentifierSource,
}

/// Resolve the invocation's FamilyId.
///
/// Order: explicit value, shared config, instance configs by name, derivation
/// from `credential`. `snapshot` and `shared` describe the first target that
/// enumerated successfully.
pub fn resolve_identifier(
    explicit: Option<&str>,
    snapshot: Option<&HostSnapshot>,
    shared: Option<&Path>,
    credential: Option<&Credential>,
    deriver: &dyn IdentifierDeriver,
) -> RolloutResult<ResolvedIdentifier> {
    if let Some(raw) = explicit {
        return Ok(ResolvedIdentifier {
            id: FamilyId::parse(raw)?,
            source: IdentifierSource::Explicit,
        });
    }

    if let Some(snapshot) = snapshot {
        if let Some(found) = from_configs(snapshot, shared) {
            return Ok(found);
        }
    }

    let credential = credential.ok_or_else(|| RolloutError::IdentifierUnresolved {
        detail: "no FamilyId in any config and no credential to derive one from; pass --family-id"
            .to_string(),
    })?;

    let id = deriver
        .derive(credential)
        .map_err(|reason| RolloutError::IdentifierUnresolved {
            detail: format!(
                "no FamilyId in any config and derivation from {} failed: {}",
                credential.path().display(),
                reason
            ),
        })?;

    Ok(ResolvedIdentifier {
        id,
        source: IdentifierSource::Derived,
    })
}

fn from_configs(snapshot: &HostSnapshot, shared: Option<&Path>) -> Option<ResolvedIdentifier> {
    if let Some(path) = shared {
        if let Some(id) = snapshot.included_content(path).and_then(first_family_id) {
            return Some(ResolvedIdentifier {
                id,
                source: IdentifierSource::SharedConfig(path.to_path_buf()),
            });
        }
    }

    let mut instances: Vec<_> = snapshot.instances.iter().collect();
    instances.sort_by(|a, b| a.name().cmp(b.name()));

    instances.into_iter().find_map(|snap| {
        let id = snap.config.as_deref().and_then(first_family_id)?;
        Some(ResolvedIdentifier {
            id,
            source: IdentifierSource::InstanceConfig {
                instance: snap.name().to_string(),
                path: snap.instance.config_path.clone(),
            },
        })
    })
}

fn first_family_id(text: &str) -> Option<FamilyId> {
    directive_values(text, FAMILY_ID_DIRECTIVE)
        .into_iter()
        .find_map(|value| FamilyId::parse(&value).ok())
}
