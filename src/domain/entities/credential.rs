//! Credential entity - the family secret key being rolled out.

use std::fmt;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{RolloutError, RolloutResult};

/// File name suffix every family credential carries
pub const CREDENTIAL_SUFFIX: &str = ".secret_family_key";

/// Suffix of the public identifier file `tor --keygen-family` writes next to
/// the secret key
pub const PUBLIC_ID_SUFFIX: &str = ".public_family_id";

/// A family secret key, loaded once per invocation.
///
/// The bytes never appear in `Debug` output.
#[derive(Clone)]
pub struct Credential {
    path: PathBuf,
    file_name: String,
    bytes: Vec<u8>,
    sha256: String,
}

impl Credential {
    /// Read and validate a credential file
    pub fn load(path: &Path) -> RolloutResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| RolloutError::InvalidCredential {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(path, bytes)
    }

    /// Validate an in-memory credential that claims to come from `path`
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> RolloutResult<Self> {
        let invalid = |reason: &str| RolloutError::InvalidCredential {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid("path has no file name"))?
            .to_string();

        let stem = file_name
            .strip_suffix(CREDENTIAL_SUFFIX)
            .ok_or_else(|| invalid(&format!("file name must end with {}", CREDENTIAL_SUFFIX)))?;
        if stem.is_empty() || stem.starts_with('.') || stem.contains(char::is_whitespace) {
            return Err(invalid("file name needs a plain family name before the suffix"));
        }
        if bytes.is_empty() {
            return Err(invalid("file is empty"));
        }

        let sha256 = format!("{:x}", Sha256::digest(&bytes));

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            bytes,
            sha256,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex SHA-256 of the key bytes
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Family name (file name without the suffix)
    pub fn family_name(&self) -> &str {
        self.file_name
            .strip_suffix(CREDENTIAL_SUFFIX)
            .unwrap_or(&self.file_name)
    }

    /// Path of the public identifier file minted alongside this key
    pub fn public_id_path(&self) -> PathBuf {
        self.path
            .with_file_name(format!("{}{}", self.family_name(), PUBLIC_ID_SUFFIX))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("path", &self.path)
            .field("sha256", &self.sha256)
            .finish_non_exhaustive()
    }
}
