use clap::Parser;
use xtts_config::{BindArgs, HardwareArgs, ModelArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "XTTS container bootstrap", long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub hardware: HardwareArgs,

    #[command(flatten)]
    pub bind: BindArgs,

    /// Provision the model artifacts and exit without starting the server.
    #[arg(long, help_heading = "Application")]
    pub skip_launch: bool,
}
