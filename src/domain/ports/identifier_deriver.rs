//! IdentifierDeriver port - re-derives a FamilyId from key material.

use crate::domain::entities::Credential;
use crate::domain::value_objects::FamilyId;

/// Deterministic derivation of a family identifier from a credential.
///
/// The same credential must always yield the same identifier.
pub trait IdentifierDeriver {
    fn derive(&self, credential: &Credential) -> Result<FamilyId, String>;
}
