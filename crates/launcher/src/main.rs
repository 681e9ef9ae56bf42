use clap::Parser;
use tracing::error;

use xtts_launcher::{app, args::Args, logging};

fn main() {
    logging::init();
    let args = Args::parse();
    match app::run(args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            error!(error = %err, "bootstrap failed");
            std::process::exit(err.exit_code());
        }
    }
}
