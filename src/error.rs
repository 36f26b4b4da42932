//! Error types for relayctl
//!
//! Uses `thiserror` for library errors; the binary wraps them with `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rollout operations
pub type RolloutResult<T> = Result<T, RolloutError>;

/// Main error type for rollout operations
#[derive(Error, Debug)]
pub enum RolloutError {
    /// A target descriptor could not be parsed
    #[error("malformed target '{input}': {reason}")]
    MalformedTarget { input: String, reason: String },

    /// The target refused every elevation strategy
    #[error("root privileges required on {target}; grant them with: {remediation}")]
    PrivilegeRequired { target: String, remediation: String },

    /// The remote execution channel could not reach the target
    #[error("connection to {target} failed: {message}")]
    ConnectionFailed { target: String, message: String },

    /// No FamilyId was supplied and none could be resolved
    #[error("could not resolve a FamilyId: {detail}")]
    IdentifierUnresolved { detail: String },

    /// A configuration file or key directory could not be changed
    #[error("mutation failed on {target}: {message}")]
    MutationFailed { target: String, message: String },

    /// The service manager rejected both reload and restart
    #[error("reload failed on {target}: {message}")]
    ReloadFailed { target: String, message: String },

    /// A remote procedure exited unsuccessfully
    #[error("{step} failed on {target} (exit {status}): {stderr}")]
    CommandFailed {
        target: String,
        step: &'static str,
        status: i32,
        stderr: String,
    },

    /// Procedure output did not match the expected record format
    #[error("unexpected output from {target}: {message}")]
    Protocol { target: String, message: String },

    /// The credential file is missing, empty or misnamed
    #[error("invalid credential {path}: {reason}")]
    InvalidCredential { path: PathBuf, reason: String },

    /// Configuration file could not be parsed
    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RolloutError {
    /// Stable machine-readable name, used in JSON output and status lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedTarget { .. } => "MalformedTarget",
            Self::PrivilegeRequired { .. } => "PrivilegeRequired",
            Self::ConnectionFailed { .. } => "ConnectionFailed",
            Self::IdentifierUnresolved { .. } => "IdentifierUnresolved",
            Self::MutationFailed { .. } => "MutationFailed",
            Self::ReloadFailed { .. } => "ReloadFailed",
            Self::CommandFailed { .. } => "CommandFailed",
            Self::Protocol { .. } => "Protocol",
            Self::InvalidCredential { .. } => "InvalidCredential",
            Self::Config { .. } => "Config",
            Self::Io(_) => "Io",
        }
    }

    /// Remediation hint, when the error carries one
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::PrivilegeRequired { remediation, .. } => Some(remediation),
            _ => None,
        }
    }

    /// Whether this error aborts the whole invocation rather than one target
    pub fn is_invocation_fatal(&self) -> bool {
        matches!(
            self,
            Self::MalformedTarget { .. }
                | Self::IdentifierUnresolved { .. }
                | Self::InvalidCredential { .. }
                | Self::Config { .. }
        )
    }
}
