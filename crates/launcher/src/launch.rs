//! Launch plan and supervision for the `xtts_api_server` child process.

use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info};
use ureq::Agent;
use xtts_config::BootstrapConfig;
use xtts_core::{ArtifactSet, BootstrapError, BootstrapResult, HardwareMode};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything needed to start the inference server, resolved before the
/// process is spawned so the full command line can be inspected and logged.
pub struct LaunchPlan {
    python_bin: String,
    args: Vec<String>,
    health_url: String,
    speaker_dir: PathBuf,
    output_dir: PathBuf,
}

impl LaunchPlan {
    pub fn new(artifacts: &ArtifactSet, config: &BootstrapConfig, mode: HardwareMode) -> Self {
        let server = &config.server;

        let mut args = vec![
            "-m".to_string(),
            "xtts_api_server".to_string(),
            "--host".to_string(),
            server.host.clone(),
            "--port".to_string(),
            server.port.to_string(),
            "--listen".to_string(),
            "--model-source".to_string(),
            "local".to_string(),
            "--model-folder".to_string(),
            artifacts.dir().display().to_string(),
            "--speaker-folder".to_string(),
            server.speaker_dir.display().to_string(),
            "--output".to_string(),
            server.output_dir.display().to_string(),
        ];
        match mode {
            HardwareMode::Gpu => args.push("--deepspeed".to_string()),
            HardwareMode::GpuLowVram | HardwareMode::Cpu => args.push("--lowvram".to_string()),
        }
        if server.use_cache {
            args.push("--use-cache".to_string());
        }

        Self {
            python_bin: server.python_bin.clone(),
            args,
            // The probe runs inside the container, so loopback is always the
            // right address regardless of the bind host.
            health_url: format!("http://127.0.0.1:{}/health", server.port),
            speaker_dir: server.speaker_dir.clone(),
            output_dir: server.output_dir.clone(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    /// Create the runtime directories the server expects to exist.
    pub fn prepare_dirs(&self) -> BootstrapResult<()> {
        for dir in [&self.speaker_dir, &self.output_dir] {
            fs::create_dir_all(dir).map_err(|err| {
                BootstrapError::launch(format!(
                    "failed to create directory {}: {err}",
                    dir.display()
                ))
            })?;
        }
        Ok(())
    }

    pub fn spawn(&self) -> BootstrapResult<ServerHandle> {
        self.prepare_dirs()?;
        info!(python = %self.python_bin, "starting inference server");
        debug!(args = ?self.args, "server command line");
        let child = Command::new(&self.python_bin)
            .args(&self.args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|err| {
                BootstrapError::launch(format!("failed to spawn `{}`: {err}", self.python_bin))
            })?;
        Ok(ServerHandle::from_parts(child, self.health_url.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Ready,
    NotReady,
}

/// A running (or recently spawned) inference server process.
pub struct ServerHandle {
    child: Child,
    health_url: String,
    agent: Agent,
}

impl ServerHandle {
    pub fn from_parts(child: Child, health_url: String) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(PROBE_TIMEOUT).build();
        Self {
            child,
            health_url,
            agent,
        }
    }

    /// One-shot health check. Only a success response counts as ready; an
    /// error status, refused connection, or timeout does not.
    pub fn probe(&self) -> Liveness {
        match self.agent.get(&self.health_url).call() {
            Ok(_) => Liveness::Ready,
            Err(_) => Liveness::NotReady,
        }
    }

    /// Poll the health endpoint until the server answers or the startup
    /// window closes. A child that exits during the window is a launch
    /// failure regardless of remaining time.
    pub fn wait_ready(&mut self, window: Duration, poll: Duration) -> BootstrapResult<()> {
        let deadline = Instant::now() + window;
        loop {
            if let Some(status) = self.child.try_wait().map_err(|err| {
                BootstrapError::launch(format!("failed to poll server process: {err}"))
            })? {
                return Err(BootstrapError::launch(format!(
                    "inference server exited during startup ({status})"
                )));
            }
            if self.probe() == Liveness::Ready {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BootstrapError::launch(format!(
                    "inference server not ready within {}s",
                    window.as_secs()
                )));
            }
            std::thread::sleep(poll);
        }
    }

    /// Supervise the server until it exits and pass its status through.
    pub fn wait(&mut self) -> BootstrapResult<i32> {
        let status = self
            .child
            .wait()
            .map_err(|err| BootstrapError::launch(format!("failed to wait on server: {err}")))?;
        info!(%status, "inference server exited");
        Ok(status.code().unwrap_or(1))
    }

    pub fn shutdown(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
