//! Unified error taxonomy for the bootstrap sequence.
//!
//! Every variant is fatal and maps to a distinct process exit code; the only
//! retried condition (a transient network failure during fetch) is absorbed
//! inside the fetch manager and surfaces here as `Fetch` once retries are
//! exhausted.

use crate::types::ArtifactRole;

/// Main error type for bootstrap operations.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// No usable model source could be determined.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The registry rejected the credential, or a private reference had none.
    #[error("authentication failed for `{reference}`: {reason}")]
    Authentication { reference: String, reason: String },

    /// An artifact could not be retrieved after all retries.
    #[error("fetch failed for {role} ({file}) after {attempts} attempt(s): {reason}")]
    Fetch {
        role: ArtifactRole,
        file: String,
        attempts: u32,
        reason: String,
    },

    /// The artifact directory ran out of space while writing.
    #[error("insufficient disk space while writing {role} ({file}): {reason}")]
    DiskSpace {
        role: ArtifactRole,
        file: String,
        reason: String,
    },

    /// An artifact is present but structurally implausible.
    #[error("invalid artifact for {role} at {path}: {reason}")]
    InvalidArtifact {
        role: ArtifactRole,
        path: String,
        reason: String,
    },

    /// The inference server failed to start or died during startup.
    #[error("inference server launch failed: {0}")]
    Launch(String),
}

/// Convenience alias for bootstrap results.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

impl BootstrapError {
    /// Process exit code for this error class. Zero is reserved for the
    /// server-ready path; every class gets its own code so container logs
    /// and exit statuses agree.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 2,
            Self::Authentication { .. } => 3,
            Self::Fetch { .. } => 4,
            Self::DiskSpace { .. } => 5,
            Self::InvalidArtifact { .. } => 6,
            Self::Launch(_) => 7,
        }
    }

    /// Create a configuration error with message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a launch error with message.
    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch(msg.into())
    }
}
