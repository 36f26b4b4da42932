//! FamilyId value object - the identifier every instance of one family shares.

use std::fmt;

use crate::error::{RolloutError, RolloutResult};

/// Torrc option carrying the family identifier
pub const FAMILY_ID_DIRECTIVE: &str = "FamilyId";

/// Legacy torrc option listing member fingerprints
pub const MY_FAMILY_DIRECTIVE: &str = "MyFamily";

/// An opaque family identifier.
///
/// Validated to be a single non-empty printable token so it can be written as
/// the value of a torrc line without quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FamilyId(String);

impl FamilyId {
    pub fn parse(raw: &str) -> RolloutResult<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(RolloutError::IdentifierUnresolved {
                detail: "empty FamilyId".to_string(),
            });
        }
        if !value.chars().all(|c| c.is_ascii_graphic()) {
            return Err(RolloutError::IdentifierUnresolved {
                detail: format!("'{}' is not a single printable token", value),
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The torrc line declaring this identifier
    pub fn directive_line(&self) -> String {
        format!("{} {}", FAMILY_ID_DIRECTIVE, self.0)
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
