//! Bootstrap configuration, resolved once at the process boundary.
//!
//! Layering order (later wins): built-in defaults, optional TOML file,
//! environment variables, CLI arguments. The result is immutable for the
//! rest of the bootstrap; no stage re-reads the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use xtts_core::{BootstrapError, BootstrapResult, Credential};

/// Registry entry served when nothing else is configured, so the container
/// always has a deterministic model to start from.
pub const DEFAULT_REPO_ID: &str = "Genarabia-ai/Kuwaiti_XTTS_Latest";

/// Documented fixed port of the inference server.
pub const DEFAULT_PORT: u16 = 8020;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BootstrapConfig {
    pub model: ModelSettings,
    pub hardware: HardwareSettings,
    pub server: ServerSettings,
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    /// Directory holding (or receiving) the three model artifacts.
    pub dir: PathBuf,
    /// Registry entry to fetch when the local directory is incomplete.
    pub repo_id: String,
    /// Registry base URL.
    pub endpoint: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/app/models"),
            repo_id: DEFAULT_REPO_ID.to_string(),
            endpoint: "https://huggingface.co".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct HardwareSettings {
    /// Skip the accelerator probe and launch in CPU mode.
    pub force_cpu: bool,
    /// Prefer the reduced-memory launch mode even when a GPU is present.
    pub low_vram: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address; all interfaces for container reachability.
    pub host: String,
    pub port: u16,
    /// Fixed, known location for voice-cloning reference audio.
    pub speaker_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Enable the inference server's response cache.
    pub use_cache: bool,
    /// Interpreter used to start `xtts_api_server`.
    pub python_bin: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            speaker_dir: PathBuf::from("/app/speakers"),
            output_dir: PathBuf::from("/app/outputs"),
            use_cache: true,
            python_bin: "python".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchSettings {
    /// Attempts per artifact before a transient failure becomes fatal.
    pub max_attempts: u32,
    /// First retry delay; doubles on each subsequent attempt.
    pub initial_backoff_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
        }
    }
}

impl FetchSettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

/// Sparse overlay applied on top of a `BootstrapConfig`. Both the
/// environment capture and the CLI arguments reduce to one of these.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigOverrides {
    pub model_dir: Option<PathBuf>,
    pub repo_id: Option<String>,
    pub endpoint: Option<String>,
    pub force_cpu: Option<bool>,
    pub low_vram: Option<bool>,
    pub port: Option<u16>,
    pub speaker_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub python_bin: Option<String>,
}

impl std::ops::AddAssign<&ConfigOverrides> for BootstrapConfig {
    fn add_assign(&mut self, rhs: &ConfigOverrides) {
        if let Some(dir) = rhs.model_dir.as_ref() {
            self.model.dir = dir.clone();
        }
        if let Some(repo_id) = rhs.repo_id.as_ref() {
            self.model.repo_id = repo_id.clone();
        }
        if let Some(endpoint) = rhs.endpoint.as_ref() {
            self.model.endpoint = endpoint.clone();
        }
        if let Some(force_cpu) = rhs.force_cpu {
            self.hardware.force_cpu = force_cpu;
        }
        if let Some(low_vram) = rhs.low_vram {
            self.hardware.low_vram = low_vram;
        }
        if let Some(port) = rhs.port {
            self.server.port = port;
        }
        if let Some(dir) = rhs.speaker_dir.as_ref() {
            self.server.speaker_dir = dir.clone();
        }
        if let Some(dir) = rhs.output_dir.as_ref() {
            self.server.output_dir = dir.clone();
        }
        if let Some(bin) = rhs.python_bin.as_ref() {
            self.server.python_bin = bin.clone();
        }
    }
}

/// Fully resolved configuration plus the registry credential. The credential
/// travels outside the config struct so it can never be serialized with it.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: BootstrapConfig,
    pub credential: Option<Credential>,
}

impl BootstrapConfig {
    /// Load the config file layer. An explicitly requested file that does
    /// not exist or does not parse is a configuration error; no file means
    /// defaults.
    pub fn load(path: Option<&Path>) -> BootstrapResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path).map_err(|err| {
            BootstrapError::configuration(format!(
                "failed to read configuration file {}: {err}",
                path.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            BootstrapError::configuration(format!(
                "failed to parse configuration file {}: {err}",
                path.display()
            ))
        })
    }
}

/// Capture the recognized environment variables into an overlay plus the
/// optional registry credential. The lookup function is injected so tests
/// never have to mutate process environment.
pub fn env_overrides<F>(var: F) -> BootstrapResult<(ConfigOverrides, Option<Credential>)>
where
    F: Fn(&str) -> Option<String>,
{
    let parse_port = |raw: String| {
        raw.parse::<u16>().map_err(|err| {
            BootstrapError::configuration(format!("invalid XTTS_PORT `{raw}`: {err}"))
        })
    };

    let overrides = ConfigOverrides {
        model_dir: var("MODEL_DIR").map(PathBuf::from),
        repo_id: var("HUGGINGFACE_MODEL"),
        endpoint: var("HUGGINGFACE_ENDPOINT"),
        force_cpu: var("XTTS_FORCE_CPU").map(|raw| truthy(&raw)),
        low_vram: var("XTTS_LOWVRAM").map(|raw| truthy(&raw)),
        port: var("XTTS_PORT").map(parse_port).transpose()?,
        speaker_dir: var("SPEAKER_STORE").map(PathBuf::from),
        output_dir: var("OUTPUT_DIR").map(PathBuf::from),
        python_bin: var("XTTS_PYTHON"),
    };

    let credential = var("HUGGINGFACE_TOKEN")
        .map(|raw| raw.trim().to_string())
        .filter(|token| !token.is_empty())
        .map(Credential::new);

    Ok((overrides, credential))
}

fn truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Resolve the full configuration at the process boundary.
pub fn resolve<F>(
    file: Option<&Path>,
    var: F,
    cli: &ConfigOverrides,
) -> BootstrapResult<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = BootstrapConfig::load(file)?;
    let (env_layer, credential) = env_overrides(var)?;
    config += &env_layer;
    config += cli;
    Ok(ResolvedConfig { config, credential })
}
