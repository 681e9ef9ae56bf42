//! Structural artifact validation before the expensive server launch.
//!
//! The checks are deliberately shallow: they catch truncated or swapped
//! downloads without loading the model, which is the inference server's job.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use xtts_core::{ArtifactFile, ArtifactRole, ArtifactSet, BootstrapError, BootstrapResult};

/// ZIP local-file magic; `torch.save` has used a zip container since 1.6.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
/// First byte of a protocol-2+ pickle stream (legacy checkpoints).
const PICKLE_PROTO: u8 = 0x80;

/// Confirm every artifact is present, non-empty, and structurally
/// plausible. Files are re-checked on disk rather than trusting discovery,
/// since validation is the last gate before launch.
pub fn validate(artifacts: &ArtifactSet) -> BootstrapResult<()> {
    for file in artifacts.iter() {
        check_present(file)?;
        match file.role {
            ArtifactRole::Config => check_json_document(file)?,
            ArtifactRole::Vocabulary => check_json_leading_byte(file)?,
            ArtifactRole::Weights => check_checkpoint_magic(file)?,
        }
    }
    Ok(())
}

fn check_present(file: &ArtifactFile) -> BootstrapResult<()> {
    let meta = fs::metadata(&file.path).map_err(|err| invalid(file, format!("missing: {err}")))?;
    if !meta.is_file() {
        return Err(invalid(file, "not a regular file".to_string()));
    }
    if meta.len() == 0 {
        return Err(invalid(file, "file is empty".to_string()));
    }
    Ok(())
}

/// The model config is small; parse it fully.
fn check_json_document(file: &ArtifactFile) -> BootstrapResult<()> {
    let contents = fs::read_to_string(&file.path)
        .map_err(|err| invalid(file, format!("unreadable: {err}")))?;
    serde_json::from_str::<serde_json::Value>(&contents)
        .map_err(|err| invalid(file, format!("not well-formed JSON: {err}")))?;
    Ok(())
}

/// The vocabulary can be large; only sniff the leading byte.
fn check_json_leading_byte(file: &ArtifactFile) -> BootstrapResult<()> {
    let first = leading_bytes::<1>(&file.path, file)?;
    let byte = first[0];
    if byte != b'{' && byte != b'[' {
        return Err(invalid(
            file,
            format!("expected a JSON document, found leading byte 0x{byte:02x}"),
        ));
    }
    Ok(())
}

fn check_checkpoint_magic(file: &ArtifactFile) -> BootstrapResult<()> {
    let head = leading_bytes::<4>(&file.path, file)?;
    if head == ZIP_MAGIC || head[0] == PICKLE_PROTO {
        return Ok(());
    }
    Err(invalid(
        file,
        "not a recognized checkpoint container (expected zip or pickle)".to_string(),
    ))
}

fn leading_bytes<const N: usize>(path: &Path, file: &ArtifactFile) -> BootstrapResult<[u8; N]> {
    let mut handle =
        File::open(path).map_err(|err| invalid(file, format!("unreadable: {err}")))?;
    let mut buf = [0u8; N];
    handle
        .read_exact(&mut buf)
        .map_err(|err| invalid(file, format!("shorter than {N} bytes: {err}")))?;
    Ok(buf)
}

fn invalid(file: &ArtifactFile, reason: String) -> BootstrapError {
    BootstrapError::InvalidArtifact {
        role: file.role,
        path: file.path.display().to_string(),
        reason,
    }
}
