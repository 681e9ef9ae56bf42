//! Provisioning milestones for observability.
//!
//! Events are a logging side effect only; control flow never depends on an
//! observer. The default implementation is a no-op so embedding callers are
//! not forced to care.

use std::fmt;
use std::time::Duration;

use tracing::info;
use xtts_core::ArtifactRole;

#[derive(Debug, Clone)]
pub enum ProvisionEvent {
    SourceResolved {
        reference: String,
        local: bool,
    },

    /// Whether a registry credential was found in the environment. Only the
    /// presence is recorded, never the value.
    AuthDetected {
        repo_id: String,
        authenticated: bool,
    },

    FetchStarted {
        role: ArtifactRole,
        file: String,
    },

    FetchSkipped {
        role: ArtifactRole,
        file: String,
    },

    FetchRetried {
        role: ArtifactRole,
        attempt: u32,
        delay: Duration,
        reason: String,
    },

    FetchFinished {
        role: ArtifactRole,
        bytes: u64,
        duration: Duration,
    },

    ArtifactsValidated {
        dir: String,
        total_bytes: u64,
    },
}

impl fmt::Display for ProvisionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ProvisionEvent::*;

        match self {
            SourceResolved { reference, local } => {
                let kind = if *local { "local" } else { "registry" };
                write!(f, "SourceResolved {reference} ({kind})")
            }
            AuthDetected {
                repo_id,
                authenticated,
            } => {
                if *authenticated {
                    write!(f, "AuthDetected {repo_id} credential=present")
                } else {
                    write!(f, "AuthDetected {repo_id} credential=absent")
                }
            }
            FetchStarted { role, file } => write!(f, "FetchStarted {role} file={file}"),
            FetchSkipped { role, file } => {
                write!(f, "FetchSkipped {role} file={file} (already present)")
            }
            FetchRetried {
                role,
                attempt,
                delay,
                reason,
            } => write!(
                f,
                "FetchRetried {role} attempt={attempt} retry_in={:.1}s: {reason}",
                delay.as_secs_f64()
            ),
            FetchFinished {
                role,
                bytes,
                duration,
            } => write!(
                f,
                "FetchFinished {role} {bytes} bytes in {:.1}s",
                duration.as_secs_f64()
            ),
            ArtifactsValidated { dir, total_bytes } => {
                write!(f, "ArtifactsValidated {dir} total={total_bytes} bytes")
            }
        }
    }
}

/// Observer interface for provisioning milestones.
pub trait ProvisionObserver: Send + Sync {
    fn on_event(&self, _event: &ProvisionEvent) {}
}

#[derive(Debug, Default)]
pub struct NoopObserver;

impl ProvisionObserver for NoopObserver {}

/// Observer that forwards every milestone to the tracing subscriber, making
/// container logs self-diagnosing without a shell into the container.
#[derive(Debug, Default)]
pub struct LogObserver;

impl ProvisionObserver for LogObserver {
    fn on_event(&self, event: &ProvisionEvent) {
        info!("{event}");
    }
}
