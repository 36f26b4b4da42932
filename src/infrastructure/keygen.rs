//! Family key material: generation with `tor --keygen-family` and FamilyId
//! derivation from an existing key.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::domain::entities::{Credential, CREDENTIAL_SUFFIX, PUBLIC_ID_SUFFIX};
use crate::domain::ports::IdentifierDeriver;
use crate::domain::value_objects::{is_valid_instance_name, FamilyId};
use crate::error::{RolloutError, RolloutResult};

const KEY_PLACEHOLDER: &str = "{key}";

/// Files written by one key generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKey {
    pub secret: PathBuf,
    pub public: PathBuf,
    pub family_id: Option<FamilyId>,
}

/// Run `<tor> --keygen-family <name>` inside `dir`.
///
/// Refuses to overwrite an existing secret key.
pub fn generate_family_key(tor: &str, dir: &Path, name: &str) -> RolloutResult<GeneratedKey> {
    if !is_valid_instance_name(name) {
        return Err(RolloutError::InvalidCredential {
            path: dir.join(name),
            reason: "family name may only contain letters, digits, '-' and '_'".to_string(),
        });
    }

    let secret = dir.join(format!("{}{}", name, CREDENTIAL_SUFFIX));
    let public = dir.join(format!("{}{}", name, PUBLIC_ID_SUFFIX));
    if secret.exists() {
        return Err(RolloutError::InvalidCredential {
            path: secret,
            reason: "already exists; refusing to overwrite".to_string(),
        });
    }

    std::fs::create_dir_all(dir)?;
    tracing::info!(dir = %dir.display(), name, "generating family key");

    let output = Command::new(tor)
        .arg("--keygen-family")
        .arg(name)
        .current_dir(dir)
        .output()
        .map_err(|e| RolloutError::CommandFailed {
            target: "localhost".to_string(),
            step: "keygen",
            status: -1,
            stderr: format!("cannot run {}: {}", tor, e),
        })?;

    if !output.status.success() || !secret.exists() {
        return Err(RolloutError::CommandFailed {
            target: "localhost".to_string(),
            step: "keygen",
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let family_id = read_public_id(&public);
    Ok(GeneratedKey {
        secret,
        public,
        family_id,
    })
}

fn read_public_id(path: &Path) -> Option<FamilyId> {
    let content = std::fs::read_to_string(path).ok()?;
    let token = content.split_whitespace().next()?;
    FamilyId::parse(token).ok()
}

/// Derives a FamilyId from key material: the `.public_family_id` file minted
/// next to the key, else a configured command.
#[derive(Debug, Clone, Default)]
pub struct KeyMaterialDeriver {
    derive_command: Option<String>,
}

impl KeyMaterialDeriver {
    pub fn new(derive_command: Option<String>) -> Self {
        Self { derive_command }
    }

    fn run_command(&self, template: &str, key: &Path) -> Result<FamilyId, String> {
        let quoted = shell_words::quote(&key.to_string_lossy()).into_owned();
        let command = template.replace(KEY_PLACEHOLDER, &quoted);
        tracing::debug!(%command, "deriving FamilyId");

        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .output()
            .map_err(|e| format!("cannot run derive command: {}", e))?;
        if !output.status.success() {
            return Err(format!(
                "derive command exited with {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let token = stdout
            .split_whitespace()
            .next()
            .ok_or_else(|| "derive command printed nothing".to_string())?;
        FamilyId::parse(token).map_err(|e| e.to_string())
    }
}

impl IdentifierDeriver for KeyMaterialDeriver {
    fn derive(&self, credential: &Credential) -> Result<FamilyId, String> {
        let sibling = credential.public_id_path();
        if let Some(id) = read_public_id(&sibling) {
            tracing::debug!(path = %sibling.display(), "FamilyId read from public id file");
            return Ok(id);
        }

        match &self.derive_command {
            Some(template) => self.run_command(template, credential.path()),
            None => Err(format!(
                "{} not found and no identifier.derive_command configured",
                sibling.display()
            )),
        }
    }
}
