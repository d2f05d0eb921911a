//! Where module metadata comes from.
//!
//! The resolver only sees [`ArtifactSource`]. The filesystem layout is
//! `<root>/<group with dots as slashes>/<artifact>/<version>/module.json`,
//! optionally next to `<artifact>-<version>.jar`.

use crate::error::ResolutionError;
use crate::version::Version;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use manifold_types::{Coordinate, ModuleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// File name of per-version module metadata inside a repository.
pub const MODULE_FILE_NAME: &str = "module.json";

/// Whether a dependency edge is needed to compile against the module or only
/// to run it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    #[default]
    Compile,
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDependency {
    /// Version-less coordinates are resolved through dependency management.
    pub coordinate: Coordinate,

    #[serde(default, rename = "scope")]
    pub kind: DependencyKind,
}

impl ModuleDependency {
    pub fn compile(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            kind: DependencyKind::Compile,
        }
    }

    pub fn runtime(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            kind: DependencyKind::Runtime,
        }
    }
}

/// Metadata of one module version, as read from a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMetadata {
    pub coordinate: Coordinate,

    /// Name of the repository that served the metadata.
    pub repository: String,

    pub dependencies: Vec<ModuleDependency>,

    pub artifact: Option<Utf8PathBuf>,
}

/// Source of module metadata.
pub trait ArtifactSource {
    fn name(&self) -> &str;

    /// Versions available for `module`, ascending. Empty when the module is unknown.
    fn versions(&self, module: &ModuleId) -> anyhow::Result<Vec<String>>;

    /// Metadata for an exact coordinate, or `None` when this source does not carry it.
    fn metadata(&self, coordinate: &Coordinate) -> anyhow::Result<Option<ModuleMetadata>>;
}

#[derive(Debug, Deserialize)]
struct ModuleFile {
    #[serde(default)]
    coordinate: Option<Coordinate>,

    #[serde(default)]
    dependencies: Vec<ModuleDependency>,
}

/// Directory-backed repository.
#[derive(Debug, Clone)]
pub struct FsRepository {
    name: String,
    root: Utf8PathBuf,
}

impl FsRepository {
    pub fn new(name: impl Into<String>, root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn module_dir(&self, module: &ModuleId) -> Utf8PathBuf {
        let mut dir = self.root.clone();
        for segment in module.group.split('.') {
            dir.push(segment);
        }
        dir.push(&module.artifact);
        dir
    }
}

impl ArtifactSource for FsRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn versions(&self, module: &ModuleId) -> anyhow::Result<Vec<String>> {
        let dir = self.module_dir(module);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in dir
            .read_dir_utf8()
            .with_context(|| format!("list versions in {}", dir))?
        {
            let entry = entry.with_context(|| format!("read entry in {}", dir))?;
            if entry.path().join(MODULE_FILE_NAME).is_file() {
                out.push(entry.file_name().to_string());
            }
        }
        out.sort_by(|a, b| Version::parse(a).cmp(&Version::parse(b)).then_with(|| a.cmp(b)));
        Ok(out)
    }

    fn metadata(&self, coordinate: &Coordinate) -> anyhow::Result<Option<ModuleMetadata>> {
        let Some(version) = coordinate.version.as_deref() else {
            return Ok(None);
        };
        let dir = self.module_dir(&coordinate.module()).join(version);
        let path = dir.join(MODULE_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }
        debug!(repository = %self.name, path = %path, "reading module metadata");

        let contents = fs::read_to_string(&path).with_context(|| format!("read {}", path))?;
        let invalid = |message: String| ResolutionError::InvalidMetadata {
            coordinate: coordinate.clone(),
            repository: self.name.clone(),
            message,
        };
        let file: ModuleFile =
            serde_json::from_str(&contents).map_err(|e| invalid(format!("{path}: {e}")))?;
        if let Some(declared) = &file.coordinate
            && declared != coordinate
        {
            return Err(invalid(format!("{path} declares {declared}")).into());
        }

        let jar = dir.join(format!("{}-{}.jar", coordinate.artifact, version));
        Ok(Some(ModuleMetadata {
            coordinate: coordinate.clone(),
            repository: self.name.clone(),
            dependencies: file.dependencies,
            artifact: jar.is_file().then_some(jar),
        }))
    }
}

/// In-memory repository for embedding and testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    name: String,
    modules: BTreeMap<Coordinate, ModuleMetadata>,
}

impl InMemoryRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: BTreeMap::new(),
        }
    }

    /// Add a module version. `coordinate` must carry a version.
    pub fn insert(&mut self, coordinate: Coordinate, dependencies: Vec<ModuleDependency>) {
        let metadata = ModuleMetadata {
            coordinate: coordinate.clone(),
            repository: self.name.clone(),
            dependencies,
            artifact: None,
        };
        self.modules.insert(coordinate, metadata);
    }

    /// Builder form of [`InMemoryRepository::insert`].
    pub fn with_module(mut self, coordinate: Coordinate, dependencies: Vec<ModuleDependency>) -> Self {
        self.insert(coordinate, dependencies);
        self
    }
}

impl ArtifactSource for InMemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn versions(&self, module: &ModuleId) -> anyhow::Result<Vec<String>> {
        let mut out: Vec<String> = self
            .modules
            .keys()
            .filter(|c| c.group == module.group && c.artifact == module.artifact)
            .filter_map(|c| c.version.clone())
            .collect();
        out.sort_by(|a, b| Version::parse(a).cmp(&Version::parse(b)).then_with(|| a.cmp(b)));
        Ok(out)
    }

    fn metadata(&self, coordinate: &Coordinate) -> anyhow::Result<Option<ModuleMetadata>> {
        Ok(self.modules.get(coordinate).cloned())
    }
}

/// Repositories searched in declaration order; the first one carrying a
/// coordinate wins.
#[derive(Default)]
pub struct RepositoryChain {
    sources: Vec<Box<dyn ArtifactSource>>,
}

impl RepositoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: impl ArtifactSource + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn with(mut self, source: impl ArtifactSource + 'static) -> Self {
        self.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl ArtifactSource for RepositoryChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn versions(&self, module: &ModuleId) -> anyhow::Result<Vec<String>> {
        let mut out = Vec::new();
        for source in &self.sources {
            for v in source.versions(module)? {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
        }
        out.sort_by(|a, b| Version::parse(a).cmp(&Version::parse(b)).then_with(|| a.cmp(b)));
        Ok(out)
    }

    fn metadata(&self, coordinate: &Coordinate) -> anyhow::Result<Option<ModuleMetadata>> {
        for source in &self.sources {
            if let Some(found) = source.metadata(coordinate)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}
