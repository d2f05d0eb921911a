//! Default filesystem-backed port implementations.

use crate::ports::WritePort;
use anyhow::Context;
use camino::Utf8Path;
use fs_err as fs;
use manifold_descriptor::Descriptor;
use manifold_resolve::{FsRepository, RepositoryChain};
use tracing::debug;

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }

    fn remove_file(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::remove_file(path).with_context(|| format!("remove {}", path))
    }
}

/// One [`FsRepository`] per declared repository, in declaration order.
pub fn repository_chain(descriptor: &Descriptor, project_root: &Utf8Path) -> RepositoryChain {
    let mut chain = RepositoryChain::new();
    for (name, root) in descriptor.repository_roots(project_root) {
        debug!(repository = %name, root = %root, "using repository");
        chain.push(FsRepository::new(name, root));
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use manifold_descriptor::parse_descriptor;
    use manifold_resolve::ArtifactSource;
    use tempfile::TempDir;

    #[test]
    fn fs_write_port_writes_creates_and_removes() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let target = root.join("nested").join("file.txt");

        let port = FsWritePort;
        port.write_file(&target, b"hello").expect("write");
        assert_eq!(std::fs::read_to_string(&target).expect("read"), "hello");

        port.remove_file(&target).expect("remove");
        assert!(!target.exists());
        assert!(port.remove_file(&target).is_err());

        let extra_dir = root.join("extra");
        port.create_dir_all(&extra_dir).expect("mkdir");
        assert!(extra_dir.exists());
    }

    #[test]
    fn chain_follows_declared_repositories() {
        let descriptor = parse_descriptor(
            r#"
[toolchain]
version = 17

[[repositories]]
name = "local"
path = "repo"

[[repositories]]
name = "mirror"
path = "/opt/mirror"
"#,
            "manifold.toml",
        )
        .expect("parse");
        let chain = repository_chain(&descriptor, Utf8Path::new("/p"));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.name(), "chain");
    }
}
