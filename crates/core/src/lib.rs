pub mod error;
pub mod types;

pub use error::{BootstrapError, BootstrapResult};
pub use types::{
    ArtifactFile, ArtifactRole, ArtifactSet, Credential, HardwareMode, ModelReference,
};
