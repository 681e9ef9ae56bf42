#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use xtts_core::ArtifactRole;

static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

pub fn make_temp_dir() -> Result<TestTempDir> {
    let mut path = std::env::temp_dir();
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.push(format!("xtts-launcher-test-{pid}-{nanos}-{seq}"));
    fs::create_dir_all(&path)?;
    Ok(TestTempDir { path })
}

/// Write a structurally plausible artifact set into `dir`.
pub fn write_valid_artifacts(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(
        dir.join(ArtifactRole::Config.file_name()),
        br#"{"model": {"gpt_layers": 30}}"#,
    )?;
    fs::write(
        dir.join(ArtifactRole::Vocabulary.file_name()),
        br#"{"model": {"vocab": {"<pad>": 0}}}"#,
    )?;
    fs::write(
        dir.join(ArtifactRole::Weights.file_name()),
        b"PK\x03\x04checkpoint-bytes-stand-in",
    )?;
    Ok(())
}

/// Single-purpose HTTP stub standing in for the inference server's health
/// endpoint, answering a fixed status to every request.
pub struct HealthStub {
    url: String,
}

impl HealthStub {
    pub fn serve() -> Result<Self> {
        Self::serve_status(200)
    }

    pub fn serve_status(status: u16) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let url = format!("http://{}/health", listener.local_addr()?);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {status} Status\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok"
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Ok(Self { url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
