//! Port traits abstracting side effects away from the pipeline.
//!
//! Artifact metadata comes through [`manifold_resolve::ArtifactSource`] and
//! child processes through [`manifold_testrun::ProcessLauncher`].

use camino::Utf8Path;

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
    fn remove_file(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
