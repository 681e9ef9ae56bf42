//! Credential-aware artifact fetch with retry, backoff, and atomic writes.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;
use ureq::Agent;
use xtts_config::FetchSettings;
use xtts_core::{
    ArtifactRole, ArtifactSet, BootstrapError, BootstrapResult, Credential, ModelReference,
};

use crate::observer::{ProvisionEvent, ProvisionObserver};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("xtts-bootstrap/", env!("CARGO_PKG_VERSION"));

/// Suffix for in-flight downloads. A file under this name is never visible
/// to discovery or validation; only a completed rename is.
const PARTIAL_SUFFIX: &str = ".partial";

/// Linux ENOSPC; std has no stable portable classification for "disk full".
const ENOSPC: i32 = 28;

/// Downloads the artifact set for a remote model reference.
///
/// Fetches run sequentially per artifact so a failure is diagnosable by
/// role. Transient transport errors and 5xx responses are retried with
/// bounded exponential backoff; authentication rejections surface
/// immediately.
pub struct Fetcher<'a> {
    agent: Agent,
    endpoint: String,
    max_attempts: u32,
    initial_backoff: Duration,
    observer: &'a dyn ProvisionObserver,
}

/// Internal per-attempt classification. Only `Transient` is ever retried;
/// everything else is already a fatal taxonomy error.
#[derive(Debug)]
enum AttemptError {
    Transient(String),
    Fatal(BootstrapError),
}

impl<'a> Fetcher<'a> {
    pub fn new(
        endpoint: &str,
        settings: &FetchSettings,
        observer: &'a dyn ProvisionObserver,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: settings.initial_backoff(),
            observer,
        }
    }

    /// Populate `dest_dir` with the full artifact set for `reference`.
    ///
    /// Idempotent: artifacts already present and non-empty are skipped, so a
    /// warm container restart performs zero network writes.
    pub fn fetch(
        &self,
        reference: &ModelReference,
        dest_dir: &Path,
    ) -> BootstrapResult<ArtifactSet> {
        let (repo_id, credential) = match reference {
            ModelReference::Remote {
                repo_id,
                credential,
            } => (repo_id.as_str(), credential.as_ref()),
            ModelReference::Local(dir) => {
                return Err(BootstrapError::configuration(format!(
                    "fetch requested for local reference {}",
                    dir.display()
                )));
            }
        };

        self.observer.on_event(&ProvisionEvent::AuthDetected {
            repo_id: repo_id.to_string(),
            authenticated: credential.is_some(),
        });

        fs::create_dir_all(dest_dir).map_err(|err| {
            BootstrapError::configuration(format!(
                "failed to create model directory {}: {err}",
                dest_dir.display()
            ))
        })?;

        for role in ArtifactRole::ALL {
            self.fetch_artifact(repo_id, credential, role, dest_dir)?;
        }

        ArtifactSet::discover(dest_dir)?.ok_or_else(|| BootstrapError::Fetch {
            role: ArtifactRole::Weights,
            file: ArtifactRole::Weights.file_name().to_string(),
            attempts: self.max_attempts,
            reason: format!(
                "artifact set in {} is incomplete after download",
                dest_dir.display()
            ),
        })
    }

    fn fetch_artifact(
        &self,
        repo_id: &str,
        credential: Option<&Credential>,
        role: ArtifactRole,
        dest_dir: &Path,
    ) -> BootstrapResult<()> {
        let file_name = role.file_name();
        let dest = dest_dir.join(file_name);

        if is_complete(&dest) {
            self.observer.on_event(&ProvisionEvent::FetchSkipped {
                role,
                file: file_name.to_string(),
            });
            return Ok(());
        }

        // A leftover temp file from an interrupted run is stale by
        // definition; every attempt rewrites it from scratch.
        let partial = partial_path(&dest);
        let _ = fs::remove_file(&partial);

        let url = format!("{}/{repo_id}/resolve/main/{file_name}", self.endpoint);
        self.observer.on_event(&ProvisionEvent::FetchStarted {
            role,
            file: file_name.to_string(),
        });

        let start = Instant::now();
        let mut backoff = self.initial_backoff;
        for attempt in 1..=self.max_attempts {
            match self.attempt_download(repo_id, credential, role, &url, &dest, &partial) {
                Ok(bytes) => {
                    self.observer.on_event(&ProvisionEvent::FetchFinished {
                        role,
                        bytes,
                        duration: start.elapsed(),
                    });
                    return Ok(());
                }
                Err(AttemptError::Fatal(err)) => {
                    let _ = fs::remove_file(&partial);
                    return Err(err);
                }
                Err(AttemptError::Transient(reason)) => {
                    let _ = fs::remove_file(&partial);
                    if attempt == self.max_attempts {
                        return Err(BootstrapError::Fetch {
                            role,
                            file: file_name.to_string(),
                            attempts: attempt,
                            reason,
                        });
                    }
                    self.observer.on_event(&ProvisionEvent::FetchRetried {
                        role,
                        attempt,
                        delay: backoff,
                        reason,
                    });
                    std::thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }

        unreachable!("retry loop returns on the final attempt")
    }

    fn attempt_download(
        &self,
        repo_id: &str,
        credential: Option<&Credential>,
        role: ArtifactRole,
        url: &str,
        dest: &Path,
        partial: &Path,
    ) -> Result<u64, AttemptError> {
        let mut request = self.agent.get(url);
        if let Some(credential) = credential {
            request = request.set("Authorization", &format!("Bearer {}", credential.reveal()));
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(401 | 403, _)) => {
                let reason = if credential.is_some() {
                    "registry rejected the provided credential".to_string()
                } else {
                    "registry requires a credential and none was provided".to_string()
                };
                return Err(AttemptError::Fatal(BootstrapError::Authentication {
                    reference: repo_id.to_string(),
                    reason,
                }));
            }
            Err(ureq::Error::Status(code, _)) if (500..600).contains(&code) || code == 429 => {
                return Err(AttemptError::Transient(format!(
                    "registry returned HTTP {code}"
                )));
            }
            Err(ureq::Error::Status(code, _)) => {
                // 404 and friends are permanent; retrying cannot help.
                return Err(AttemptError::Fatal(BootstrapError::Fetch {
                    role,
                    file: role.file_name().to_string(),
                    attempts: 1,
                    reason: format!("registry returned HTTP {code} for `{repo_id}`"),
                }));
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(AttemptError::Transient(transport.to_string()));
            }
        };

        debug!(url, role = %role, "downloading artifact");
        let bytes = write_atomic(response.into_reader(), role, dest, partial)?;
        Ok(bytes)
    }
}

/// Stream the body to a temp name and rename into place, so an interrupted
/// download is never mistaken for a complete artifact by a later run.
fn write_atomic(
    mut reader: impl io::Read,
    role: ArtifactRole,
    dest: &Path,
    partial: &Path,
) -> Result<u64, AttemptError> {
    let map_io = |err: io::Error| classify_io_error(role, err);

    let mut file = File::create(partial).map_err(map_io)?;
    let bytes = io::copy(&mut reader, &mut file).map_err(map_io)?;
    file.sync_all().map_err(map_io)?;
    drop(file);

    if bytes == 0 {
        return Err(AttemptError::Transient(
            "registry returned an empty body".to_string(),
        ));
    }

    fs::rename(partial, dest).map_err(map_io)?;
    Ok(bytes)
}

/// Classify a local write failure. A full disk and a filesystem that will
/// never accept the write are permanent conditions; retrying them only
/// burns the backoff budget. Everything else is worth another attempt.
fn classify_io_error(role: ArtifactRole, err: io::Error) -> AttemptError {
    if err.raw_os_error() == Some(ENOSPC) {
        return AttemptError::Fatal(BootstrapError::DiskSpace {
            role,
            file: role.file_name().to_string(),
            reason: err.to_string(),
        });
    }
    match err.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            AttemptError::Fatal(BootstrapError::Fetch {
                role,
                file: role.file_name().to_string(),
                attempts: 1,
                reason: format!("write failed: {err}"),
            })
        }
        _ => AttemptError::Transient(format!("write failed: {err}")),
    }
}

fn is_complete(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    dest.with_file_name(name)
}
