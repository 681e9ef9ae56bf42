//! Source resolution: local directory vs. remote registry.

use xtts_config::BootstrapConfig;
use xtts_core::{ArtifactSet, BootstrapError, BootstrapResult, Credential, ModelReference};

/// Decide where model artifacts come from. Pure decision over filesystem
/// state and the already-resolved configuration; never touches the network.
///
/// A local directory that already holds all three non-empty artifacts always
/// wins, so offline and custom checkpoints need no extra configuration. The
/// default registry entry keeps the fallback deterministic.
pub fn resolve_source(
    config: &BootstrapConfig,
    credential: Option<Credential>,
) -> BootstrapResult<ModelReference> {
    if ArtifactSet::discover(&config.model.dir)?.is_some() {
        return Ok(ModelReference::Local(config.model.dir.clone()));
    }

    let repo_id = config.model.repo_id.trim();
    if repo_id.is_empty() {
        return Err(BootstrapError::configuration(format!(
            "no complete model found in {} and no registry model configured",
            config.model.dir.display()
        )));
    }

    Ok(ModelReference::Remote {
        repo_id: repo_id.to_string(),
        credential,
    })
}
