//! Model provisioning: decide where artifacts come from, fetch them if
//! needed, and validate the result before the server launch.
//!
//! The three stages run strictly in sequence, once per container start:
//! resolver -> fetch manager -> validator. All progress reporting goes
//! through the [`ProvisionObserver`] so callers choose how milestones are
//! surfaced.

pub mod fetch;
pub mod observer;
pub mod resolver;
pub mod validate;

pub use fetch::Fetcher;
pub use observer::{LogObserver, NoopObserver, ProvisionEvent, ProvisionObserver};
pub use resolver::resolve_source;
pub use validate::validate;

use xtts_config::BootstrapConfig;
use xtts_core::{ArtifactSet, BootstrapError, BootstrapResult, Credential, ModelReference};

/// Run the full provisioning sequence and return a validated artifact set.
pub fn provision(
    config: &BootstrapConfig,
    credential: Option<Credential>,
    observer: &dyn ProvisionObserver,
) -> BootstrapResult<ArtifactSet> {
    let reference = resolver::resolve_source(config, credential)?;
    observer.on_event(&ProvisionEvent::SourceResolved {
        reference: reference.describe(),
        local: matches!(reference, ModelReference::Local(_)),
    });

    let artifacts = match &reference {
        ModelReference::Local(dir) => ArtifactSet::discover(dir)?.ok_or_else(|| {
            // The resolver only yields Local for a complete directory, so a
            // miss here means the set changed underneath us.
            BootstrapError::configuration(format!(
                "local model directory {} is no longer complete",
                dir.display()
            ))
        })?,
        ModelReference::Remote { .. } => {
            let fetcher = Fetcher::new(&config.model.endpoint, &config.fetch, observer);
            fetcher.fetch(&reference, &config.model.dir)?
        }
    };

    validate::validate(&artifacts)?;
    observer.on_event(&ProvisionEvent::ArtifactsValidated {
        dir: artifacts.dir().display().to_string(),
        total_bytes: artifacts.iter().map(|file| file.size).sum(),
    });

    Ok(artifacts)
}
