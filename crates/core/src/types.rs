//! Data model shared across the bootstrap stages.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, BootstrapResult};

/// One required model artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactRole {
    Config,
    Weights,
    Vocabulary,
}

impl ArtifactRole {
    pub const ALL: [ArtifactRole; 3] = [Self::Config, Self::Weights, Self::Vocabulary];

    /// Fixed file name inside the model directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Config => "config.json",
            Self::Weights => "model.pth",
            Self::Vocabulary => "vocab.json",
        }
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Weights => "weights",
            Self::Vocabulary => "vocabulary",
        };
        f.write_str(label)
    }
}

/// Opaque bearer token for the model registry.
///
/// Held in process memory for the duration of the fetch; the value is
/// deliberately unreachable through `Debug`/`Display` so it cannot end up in
/// logs or serialized configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for building the Authorization header only.
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Where model artifacts come from. Immutable once resolved.
#[derive(Debug, Clone)]
pub enum ModelReference {
    /// A local directory already containing the full artifact set.
    Local(PathBuf),
    /// A registry entry, optionally access-controlled.
    Remote {
        repo_id: String,
        credential: Option<Credential>,
    },
}

impl ModelReference {
    /// Short identifier for log and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Local(dir) => format!("local:{}", dir.display()),
            Self::Remote { repo_id, .. } => repo_id.clone(),
        }
    }
}

/// A single resolved artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub role: ArtifactRole,
    pub path: PathBuf,
    pub size: u64,
}

/// The complete mapping from role to on-disk file.
///
/// Invariant: constructed only from existing, non-empty files, so holding an
/// `ArtifactSet` implies all three roles were present at discovery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    dir: PathBuf,
    files: [ArtifactFile; 3],
}

impl ArtifactSet {
    /// Probe `dir` for all three artifacts. Returns `Ok(None)` when any role
    /// is missing or empty (not an error at discovery time; the caller
    /// decides whether that means "fetch" or "fail").
    pub fn discover(dir: &Path) -> BootstrapResult<Option<Self>> {
        let mut files = Vec::with_capacity(ArtifactRole::ALL.len());
        for role in ArtifactRole::ALL {
            let path = dir.join(role.file_name());
            let Ok(meta) = fs::metadata(&path) else {
                return Ok(None);
            };
            if !meta.is_file() || meta.len() == 0 {
                return Ok(None);
            }
            files.push(ArtifactFile {
                role,
                path,
                size: meta.len(),
            });
        }
        let files: [ArtifactFile; 3] = files
            .try_into()
            .map_err(|_| BootstrapError::configuration("artifact role set changed size"))?;
        Ok(Some(Self {
            dir: dir.to_path_buf(),
            files,
        }))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn get(&self, role: ArtifactRole) -> &ArtifactFile {
        self.files
            .iter()
            .find(|file| file.role == role)
            .expect("artifact set holds every role by construction")
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtifactFile> {
        self.files.iter()
    }
}

/// Hardware execution mode for the inference server, computed once by the
/// probe and threaded through as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HardwareMode {
    /// Accelerator available; full-speed launch.
    Gpu,
    /// Accelerator available but constrained; reduced-memory launch.
    GpuLowVram,
    /// No accelerator; degraded CPU fallback.
    Cpu,
}

impl HardwareMode {
    pub fn is_accelerated(self) -> bool {
        !matches!(self, Self::Cpu)
    }
}

impl fmt::Display for HardwareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Gpu => "gpu",
            Self::GpuLowVram => "gpu-lowvram",
            Self::Cpu => "cpu",
        };
        f.write_str(label)
    }
}
