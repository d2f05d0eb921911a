//! Dependency resolution: turn descriptor declarations plus repository
//! metadata into a deterministic, lockable set of classpaths.
//!
//! This crate owns *what* gets resolved. Where module metadata comes from is
//! abstracted behind [`ArtifactSource`].

mod error;
mod lock;
mod resolver;
mod source;
mod version;

pub use error::ResolutionError;
pub use lock::{
    LOCKFILE_NAME, check_locked, fingerprint, is_fresh, lockfile_from, lockfile_json, read_lockfile,
};
pub use resolver::{Resolution, ResolvedPackage, Resolver};
pub use source::{
    ArtifactSource, DependencyKind, FsRepository, InMemoryRepository, MODULE_FILE_NAME,
    ModuleDependency, ModuleMetadata, RepositoryChain,
};
pub use version::{Version, VersionSelector};
