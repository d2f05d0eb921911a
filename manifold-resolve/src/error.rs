use manifold_types::{Coordinate, ModuleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("unresolvable coordinate {module}: not found in any repository")]
    UnknownArtifact { module: ModuleId },

    #[error("unresolvable version {coordinate}: available versions are [{}]", available.join(", "))]
    UnknownVersion {
        coordinate: Coordinate,
        available: Vec<String>,
    },

    #[error("no version for managed coordinate {module}: add it to [dependency_management]")]
    UnmanagedVersion { module: ModuleId },

    #[error("invalid metadata for {coordinate} in repository '{repository}': {message}")]
    InvalidMetadata {
        coordinate: Coordinate,
        repository: String,
        message: String,
    },

    #[error("lockfile is {reason}; run `manifold resolve` without --locked to update it")]
    LockMismatch { reason: String },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}
