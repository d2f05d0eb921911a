use crate::error::DescriptorError;
use crate::model::Descriptor;
use crate::validate::validate;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use tracing::debug;

/// The descriptor file name searched for in the project root.
pub const DESCRIPTOR_FILE_NAME: &str = "manifold.toml";

/// Locate `manifold.toml` in `project_root`.
pub fn discover(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let path = project_root.join(DESCRIPTOR_FILE_NAME);
    if path.is_file() {
        debug!("found descriptor at {}", path);
        Some(path)
    } else {
        debug!("no descriptor at {}", path);
        None
    }
}

/// Read, parse and validate the descriptor at `path`.
pub fn load_descriptor(path: &Utf8Path) -> Result<Descriptor, DescriptorError> {
    let contents = fs::read_to_string(path).map_err(|e| DescriptorError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_descriptor(&contents, path.as_str())
}

/// Discover and load the descriptor of the project at `project_root`.
pub fn load_from_root(project_root: &Utf8Path) -> Result<Descriptor, DescriptorError> {
    match discover(project_root) {
        Some(path) => load_descriptor(&path),
        None => Err(DescriptorError::NotFound {
            path: project_root.join(DESCRIPTOR_FILE_NAME),
        }),
    }
}

/// Parse and validate descriptor text. `origin` names the source in errors.
pub fn parse_descriptor(contents: &str, origin: &str) -> Result<Descriptor, DescriptorError> {
    let descriptor: Descriptor =
        toml::from_str(contents).map_err(|e| DescriptorError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
    validate(&descriptor)?;
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
[toolchain]
version = 17
"#;

    #[test]
    fn discover_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover(&root).is_none());

        std::fs::write(root.join(DESCRIPTOR_FILE_NAME), MINIMAL).expect("write");
        assert!(discover(&root).is_some());
    }

    #[test]
    fn load_from_root_reports_missing_descriptor() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let err = load_from_root(&root).expect_err("missing");
        assert!(matches!(err, DescriptorError::NotFound { .. }));
        assert!(err.to_string().contains(DESCRIPTOR_FILE_NAME));
    }

    #[test]
    fn load_from_root_parses_file() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        std::fs::write(root.join(DESCRIPTOR_FILE_NAME), MINIMAL).expect("write");

        let d = load_from_root(&root).expect("load");
        assert_eq!(d.toolchain.version, 17);
        assert_eq!(d.toolchain.language, "java");
        assert!(d.codegen.is_none());
    }

    #[test]
    fn parse_error_names_origin() {
        let err = parse_descriptor("[toolchain\nversion = 17", "inline").expect_err("bad toml");
        let msg = err.to_string();
        assert!(msg.starts_with("parse inline"), "{msg}");
    }
}
