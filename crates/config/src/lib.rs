pub mod args;
pub mod config;

pub use args::{build_config_overrides, BindArgs, HardwareArgs, ModelArgs};
pub use config::{
    resolve, BootstrapConfig, ConfigOverrides, FetchSettings, HardwareSettings, ModelSettings,
    ResolvedConfig, ServerSettings, DEFAULT_PORT, DEFAULT_REPO_ID,
};
