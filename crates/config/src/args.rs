use std::path::PathBuf;

use clap::Args;

use crate::config::ConfigOverrides;

#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Optional path to a TOML configuration file.
    #[arg(long, value_name = "PATH", help_heading = "Application")]
    pub config: Option<PathBuf>,

    /// Directory holding (or receiving) the model artifacts.
    #[arg(long, value_name = "PATH", help_heading = "Model")]
    pub model_dir: Option<PathBuf>,

    /// Registry entry to fetch when no complete local model exists.
    #[arg(long, value_name = "NAMESPACE/NAME", help_heading = "Model")]
    pub model: Option<String>,

    /// Registry base URL override.
    #[arg(long, value_name = "URL", help_heading = "Model")]
    pub endpoint: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct HardwareArgs {
    /// Skip the accelerator probe and run on CPU.
    #[arg(long, help_heading = "Hardware")]
    pub force_cpu: bool,

    /// Reduced-memory launch mode for constrained accelerators.
    #[arg(long, help_heading = "Hardware")]
    pub low_vram: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BindArgs {
    /// TCP port for the inference server.
    #[arg(long, help_heading = "Application")]
    pub port: Option<u16>,

    /// Directory of speaker reference audio for voice cloning.
    #[arg(long, value_name = "PATH", help_heading = "Application")]
    pub speaker_dir: Option<PathBuf>,
}

pub fn build_config_overrides(
    model: &ModelArgs,
    hardware: &HardwareArgs,
    bind: &BindArgs,
) -> ConfigOverrides {
    ConfigOverrides {
        model_dir: model.model_dir.clone(),
        repo_id: model.model.clone(),
        endpoint: model.endpoint.clone(),
        // Flags only override when set; absence falls through to env/file.
        force_cpu: hardware.force_cpu.then_some(true),
        low_vram: hardware.low_vram.then_some(true),
        port: bind.port,
        speaker_dir: bind.speaker_dir.clone(),
        output_dir: None,
        python_bin: None,
    }
}
