#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use xtts_core::ArtifactRole;
use xtts_provision::{ProvisionEvent, ProvisionObserver};

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
    path.push(format!("xtts-provision-test-{pid}-{nanos}-{seq}"));
    fs::create_dir_all(&path)?;
    Ok(TestTempDir { path })
}

pub const CONFIG_BODY: &[u8] = br#"{"model": {"gpt_layers": 30}, "audio": {"sample_rate": 24000}}"#;
pub const VOCAB_BODY: &[u8] = br#"{"model": {"vocab": {"<pad>": 0}}}"#;
pub const WEIGHTS_BODY: &[u8] = b"PK\x03\x04checkpoint-bytes-stand-in";

/// Write a structurally plausible artifact set into `dir`.
pub fn write_valid_artifacts(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(ArtifactRole::Config.file_name()), CONFIG_BODY)?;
    fs::write(dir.join(ArtifactRole::Vocabulary.file_name()), VOCAB_BODY)?;
    fs::write(dir.join(ArtifactRole::Weights.file_name()), WEIGHTS_BODY)?;
    Ok(())
}

pub fn body_for(path: &str) -> Vec<u8> {
    if path.ends_with(ArtifactRole::Config.file_name()) {
        CONFIG_BODY.to_vec()
    } else if path.ends_with(ArtifactRole::Vocabulary.file_name()) {
        VOCAB_BODY.to_vec()
    } else {
        WEIGHTS_BODY.to_vec()
    }
}

/// Records the name of every provisioning milestone, in order.
#[derive(Default)]
pub struct RecordingObserver {
    names: Mutex<Vec<&'static str>>,
}

impl RecordingObserver {
    pub fn names(&self) -> Vec<&'static str> {
        self.names
            .lock()
            .expect("observer mutex poisoning detected")
            .clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|seen| **seen == name).count()
    }
}

impl ProvisionObserver for RecordingObserver {
    fn on_event(&self, event: &ProvisionEvent) {
        let name = match event {
            ProvisionEvent::SourceResolved { .. } => "SourceResolved",
            ProvisionEvent::AuthDetected { .. } => "AuthDetected",
            ProvisionEvent::FetchStarted { .. } => "FetchStarted",
            ProvisionEvent::FetchSkipped { .. } => "FetchSkipped",
            ProvisionEvent::FetchRetried { .. } => "FetchRetried",
            ProvisionEvent::FetchFinished { .. } => "FetchFinished",
            ProvisionEvent::ArtifactsValidated { .. } => "ArtifactsValidated",
        };
        self.names
            .lock()
            .expect("observer mutex poisoning detected")
            .push(name);
    }
}

/// Request observed by the in-process registry stub.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path: String,
    pub authorization: Option<String>,
}

/// Minimal single-threaded HTTP responder standing in for the model
/// registry. The router maps a request to `(status, body)`.
pub struct TestRegistry {
    addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl TestRegistry {
    pub fn serve<F>(router: F) -> Result<Self>
    where
        F: Fn(&SeenRequest) -> (u16, Vec<u8>) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_writer = Arc::clone(&seen);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                if let Some(request) = read_request(&stream) {
                    let (status, body) = router(&request);
                    seen_writer
                        .lock()
                        .expect("seen-request mutex poisoning detected")
                        .push(request);
                    let _ = write_response(stream, status, &body);
                }
            }
        });

        Ok(Self { addr, seen })
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen
            .lock()
            .expect("seen-request mutex poisoning detected")
            .clone()
    }

    pub fn hits_for(&self, file_name: &str) -> usize {
        self.seen()
            .iter()
            .filter(|request| request.path.ends_with(file_name))
            .count()
    }
}

fn read_request(mut stream: &TcpStream) -> Option<SeenRequest> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        if raw.windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
    }
    let text = String::from_utf8_lossy(&raw);
    let mut lines = text.lines();
    let request_line = lines.next()?;
    let path = request_line.split_whitespace().nth(1)?.to_string();
    let authorization = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
        .map(|(_, value)| value.trim().to_string());
    Some(SeenRequest {
        path,
        authorization,
    })
}

fn write_response(mut stream: TcpStream, status: u16, body: &[u8]) -> std::io::Result<()> {
    let reason = match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    };
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )?;
    stream.write_all(body)?;
    stream.flush()
}
