use crate::error::CodegenError;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use glob::{Pattern, glob};
use tracing::debug;

/// File extensions recognised as GraphQL schema files.
pub const SCHEMA_EXTENSIONS: [&str; 2] = ["graphql", "graphqls"];

fn is_schema_file(path: &Utf8Path) -> bool {
    path.extension().is_some_and(|ext| SCHEMA_EXTENSIONS.contains(&ext))
}

/// Every schema file under `schema_paths`, resolved against `project_root`.
///
/// A path may name a file or a directory (searched recursively). The result
/// is sorted. A missing path, or no schema files at all, is
/// [`CodegenError::SchemaNotFound`].
pub fn discover_schema_files(
    project_root: &Utf8Path,
    schema_paths: &[Utf8PathBuf],
) -> Result<Vec<Utf8PathBuf>, CodegenError> {
    let resolved: Vec<Utf8PathBuf> = schema_paths.iter().map(|p| project_root.join(p)).collect();
    let mut out = Vec::new();

    for path in &resolved {
        if path.is_file() {
            if is_schema_file(path) {
                out.push(path.clone());
            }
            continue;
        }
        if !path.is_dir() {
            debug!(path = %path, "schema path does not exist");
            return Err(CodegenError::SchemaNotFound {
                paths: vec![path.clone()],
            });
        }
        for ext in SCHEMA_EXTENSIONS {
            let pattern = format!("{}/**/*.{ext}", Pattern::escape(path.as_str()));
            debug!(pattern = %pattern, "scanning for schema files");
            for entry in glob(&pattern).with_context(|| format!("glob {pattern}"))? {
                let entry = entry.map_err(|e| anyhow::anyhow!("glob error: {e}"))?;
                let found = Utf8PathBuf::from_path_buf(entry)
                    .map_err(|p| anyhow::anyhow!("non-UTF-8 path {}", p.display()))?;
                if found.is_file() {
                    out.push(found);
                }
            }
        }
    }

    // Deterministic order matters: it fixes type merge order and error positions.
    out.sort();
    out.dedup();
    if out.is_empty() {
        return Err(CodegenError::SchemaNotFound { paths: resolved });
    }
    Ok(out)
}
