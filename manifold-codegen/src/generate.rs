//! Task-level entry points: discover, parse, emit, and compare against disk.

use crate::discover::discover_schema_files;
use crate::emit::{EmitOptions, GENERATED_MARKER, GeneratedFile, emit};
use crate::error::CodegenError;
use crate::schema::{Schema, SourceDocument, parse_source};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use fs_err as fs;
use manifold_descriptor::CodegenTask;
use manifold_hash::sha256_hex;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Everything one run of the task produces, before anything touches disk.
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    /// `<output_dir>/<package path>`, absolute.
    pub package_dir: Utf8PathBuf,
    pub schema_files: Vec<Utf8PathBuf>,
    pub files: Vec<GeneratedFile>,
}

impl GeneratedOutput {
    pub fn path_of(&self, file: &GeneratedFile) -> Utf8PathBuf {
        self.package_dir.join(&file.file_name)
    }

    /// `(path, sha256)` of every file, for reports.
    pub fn digests(&self) -> Vec<(Utf8PathBuf, String)> {
        self.files
            .iter()
            .map(|f| (self.path_of(f), sha256_hex(f.contents.as_bytes())))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftKind {
    Missing,
    Changed,
    Stale,
}

/// One generated file that differs from what is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub path: Utf8PathBuf,
    pub kind: DriftKind,
    /// Unified diff from the on-disk file to the expected one.
    pub diff: String,
}

/// Package directory for `task`, resolved against `project_root`.
pub fn package_dir(project_root: &Utf8Path, task: &CodegenTask) -> Utf8PathBuf {
    let mut dir = project_root.join(&task.output_dir);
    for segment in task.package_name.split('.') {
        dir.push(segment);
    }
    dir
}

/// Discover and parse every schema file of `task`.
pub fn load_schema(
    project_root: &Utf8Path,
    task: &CodegenTask,
) -> Result<(Schema, Vec<Utf8PathBuf>), CodegenError> {
    let files = discover_schema_files(project_root, &task.schema_paths)?;
    let mut sources: Vec<SourceDocument> = Vec::with_capacity(files.len());
    for path in &files {
        let bytes = fs::read(path).with_context(|| format!("read schema {}", path))?;
        let text = schema_text(path, bytes)?;
        sources.push(parse_source(path, &text)?);
    }
    let schema = Schema::build(&sources)?;
    Ok((schema, files))
}

/// Schema files must be UTF-8; the error points at the first bad byte.
fn schema_text(path: &Utf8Path, bytes: Vec<u8>) -> Result<String, CodegenError> {
    String::from_utf8(bytes).map_err(|err| {
        let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
        let line = valid.iter().filter(|b| **b == b'\n').count() + 1;
        let line_start = valid.iter().rposition(|b| *b == b'\n').map_or(0, |at| at + 1);
        let column = String::from_utf8_lossy(&valid[line_start..]).chars().count() + 1;
        CodegenError::SchemaParse {
            path: path.to_path_buf(),
            line,
            column,
            message: "schema file is not valid UTF-8".to_string(),
        }
    })
}

/// Run the task in memory.
pub fn generate(project_root: &Utf8Path, task: &CodegenTask) -> Result<GeneratedOutput, CodegenError> {
    let (schema, schema_files) = load_schema(project_root, task)?;
    let options = EmitOptions {
        package_name: &task.package_name,
        generate_client: task.generate_client,
        generate_data_types: task.generate_data_types,
        type_mapping: &task.type_mapping,
    };
    let files = emit(&schema, &options)?;
    let output = GeneratedOutput {
        package_dir: package_dir(project_root, task),
        schema_files,
        files,
    };
    info!(
        schemas = output.schema_files.len(),
        files = output.files.len(),
        package = %task.package_name,
        "code generation planned"
    );
    Ok(output)
}

fn is_generated(path: &Utf8Path) -> anyhow::Result<bool> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path))?;
    Ok(text.lines().next() == Some(GENERATED_MARKER))
}

/// Previously generated files in the package directory that `output` no
/// longer produces. Hand-written files are never reported.
pub fn stale_files(output: &GeneratedOutput) -> Result<Vec<Utf8PathBuf>, CodegenError> {
    let dir = &output.package_dir;
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let wanted: BTreeSet<&str> = output.files.iter().map(|f| f.file_name.as_str()).collect();
    let mut out = Vec::new();
    for entry in dir
        .read_dir_utf8()
        .with_context(|| format!("list {}", dir))?
    {
        let entry = entry.with_context(|| format!("read entry in {}", dir))?;
        let path = entry.path();
        if path.extension() != Some("java") || wanted.contains(entry.file_name()) {
            continue;
        }
        if path.is_file() && is_generated(path)? {
            debug!(path = %path, "stale generated file");
            out.push(path.to_path_buf());
        }
    }
    out.sort();
    Ok(out)
}

/// Compare `output` with the package directory on disk.
pub fn check_output(output: &GeneratedOutput) -> Result<Vec<Drift>, CodegenError> {
    let mut drifts = Vec::new();
    for file in &output.files {
        let path = output.path_of(file);
        let current = if path.is_file() {
            Some(fs::read_to_string(&path).with_context(|| format!("read {}", path))?)
        } else {
            None
        };
        match current {
            Some(existing) if existing == file.contents => {}
            Some(existing) => drifts.push(Drift {
                diff: unified_diff(&path, &existing, &file.contents),
                path,
                kind: DriftKind::Changed,
            }),
            None => drifts.push(Drift {
                diff: unified_diff(&path, "", &file.contents),
                path,
                kind: DriftKind::Missing,
            }),
        }
    }
    for path in stale_files(output)? {
        let existing = fs::read_to_string(&path).with_context(|| format!("read {}", path))?;
        drifts.push(Drift {
            diff: unified_diff(&path, &existing, ""),
            path,
            kind: DriftKind::Stale,
        });
    }
    drifts.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(drifts)
}

fn unified_diff(path: &Utf8Path, old: &str, new: &str) -> String {
    let formatter = PatchFormatter::new();
    let patch = diffy::create_patch(old, new);
    let mut out = format!("--- a/{0}\n+++ b/{0}\n", path);
    let body = formatter.fmt_patch(&patch).to_string();
    // diffy emits its own ---/+++ header; keep only the hunks.
    for line in body.lines().skip_while(|l| l.starts_with("---") || l.starts_with("+++")) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Concatenated diffs, in path order.
pub fn render_drift(drifts: &[Drift]) -> String {
    drifts.iter().map(|d| d.diff.as_str()).collect()
}
