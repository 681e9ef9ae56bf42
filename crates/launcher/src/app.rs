use std::time::Duration;

use tracing::info;
use xtts_config::{build_config_overrides, resolve};
use xtts_core::BootstrapResult;
use xtts_provision::{provision, LogObserver};

use crate::args::Args;
use crate::hardware;
use crate::launch::LaunchPlan;

/// How long the inference server gets to load the checkpoint and open its
/// port. CPU cold starts of the full model are slow, hence minutes.
const STARTUP_WINDOW: Duration = Duration::from_secs(300);
const STARTUP_POLL: Duration = Duration::from_secs(2);

/// Full bootstrap sequence. Returns the process exit code: zero after a
/// clean provision-only run, otherwise the supervised server's own status.
pub fn run(args: Args) -> BootstrapResult<i32> {
    let overrides = build_config_overrides(&args.model, &args.hardware, &args.bind);
    let resolved = resolve(
        args.model.config.as_deref(),
        |key| std::env::var(key).ok(),
        &overrides,
    )?;
    let config = resolved.config;

    let artifacts = provision(&config, resolved.credential, &LogObserver)?;

    if args.skip_launch {
        info!(dir = %artifacts.dir().display(), "artifacts provisioned, launch skipped");
        return Ok(0);
    }

    let mode = hardware::detect(&config.hardware);
    info!(%mode, "hardware mode selected");

    let plan = LaunchPlan::new(&artifacts, &config, mode);
    let mut server = plan.spawn()?;
    if let Err(err) = server.wait_ready(STARTUP_WINDOW, STARTUP_POLL) {
        server.shutdown();
        return Err(err);
    }
    info!(port = config.server.port, "inference server ready");

    server.wait()
}
