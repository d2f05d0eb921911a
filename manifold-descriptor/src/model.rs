use camino::{Utf8Path, Utf8PathBuf};
use manifold_types::{Classpath, Coordinate, ModuleId, Scope};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Top-level descriptor, as read from `manifold.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub project: ProjectSection,

    /// Required: a build without a pinned runtime is rejected at parse time.
    pub toolchain: ToolchainPin,

    /// Plugin id -> version.
    #[serde(default)]
    pub plugins: BTreeMap<String, String>,

    /// Artifact repositories, searched in declaration order.
    #[serde(default)]
    pub repositories: Vec<RepositoryDecl>,

    /// Declared coordinates, keyed by scope.
    #[serde(default)]
    pub dependencies: BTreeMap<Scope, Vec<Coordinate>>,

    /// Versions for managed (version-less) coordinates. Managed versions are
    /// also enforced on transitive dependencies.
    #[serde(default)]
    pub dependency_management: BTreeMap<ModuleId, String>,

    /// Configuration inheritance, e.g. `compileOnly` extending `annotationProcessor`.
    #[serde(default)]
    pub configurations: BTreeMap<Scope, ConfigurationDecl>,

    #[serde(default)]
    pub codegen: Option<CodegenTask>,

    #[serde(default)]
    pub compile: CompileTask,

    #[serde(default)]
    pub test: TestTask,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    pub group: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainPin {
    #[serde(default = "default_language")]
    pub language: String,

    /// Required runtime major version.
    pub version: u32,

    /// Command printing the installed runtime version, e.g. `["java", "-version"]`.
    #[serde(default)]
    pub probe: Option<Vec<String>>,
}

fn default_language() -> String {
    "java".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryDecl {
    pub name: String,

    /// Repository root, relative to the project root unless absolute.
    pub path: Utf8PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationDecl {
    pub extends_from: Vec<Scope>,
}

/// GraphQL client code-generation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenTask {
    #[serde(default = "default_schema_paths")]
    pub schema_paths: Vec<Utf8PathBuf>,

    pub package_name: String,

    #[serde(default)]
    pub generate_client: bool,

    #[serde(default)]
    pub generate_data_types: bool,

    #[serde(default = "default_output_dir")]
    pub output_dir: Utf8PathBuf,

    /// GraphQL scalar name -> Java type.
    #[serde(default)]
    pub type_mapping: BTreeMap<String, String>,
}

pub(crate) fn default_schema_paths() -> Vec<Utf8PathBuf> {
    vec![Utf8PathBuf::from("src/main/resources/graphql-client")]
}

pub(crate) fn default_output_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("build/generated/sources/graphql")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileTask {
    pub command: Option<Vec<String>>,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestEngineKind {
    #[default]
    JunitPlatform,
    Cargo,
    Command,
}

impl TestEngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TestEngineKind::JunitPlatform => "junit-platform",
            TestEngineKind::Cargo => "cargo",
            TestEngineKind::Command => "command",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestTask {
    pub engine: TestEngineKind,

    /// Replaces the engine's default command line.
    pub command: Option<Vec<String>>,

    pub env: BTreeMap<String, String>,
}

/// One `(scope, coordinate)` declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Dependency {
    pub scope: Scope,
    pub coordinate: Coordinate,
}

impl Descriptor {
    /// All declarations, sorted by scope then coordinate.
    pub fn declarations(&self) -> Vec<Dependency> {
        let mut out: Vec<Dependency> = self
            .dependencies
            .iter()
            .flat_map(|(scope, coords)| {
                coords.iter().map(|c| Dependency {
                    scope: *scope,
                    coordinate: c.clone(),
                })
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Scopes visible on `cp`, after following `extends_from` transitively.
    pub fn effective_scopes(&self, cp: Classpath) -> BTreeSet<Scope> {
        let mut seen: BTreeSet<Scope> = BTreeSet::new();
        let mut stack: Vec<Scope> = cp.base_scopes().to_vec();
        while let Some(scope) = stack.pop() {
            if !seen.insert(scope) {
                continue;
            }
            if let Some(decl) = self.configurations.get(&scope) {
                stack.extend(decl.extends_from.iter().copied());
            }
        }
        seen
    }

    /// Declared coordinates feeding `cp`, sorted and deduplicated.
    pub fn roots(&self, cp: Classpath) -> Vec<Coordinate> {
        let scopes = self.effective_scopes(cp);
        let set: BTreeSet<Coordinate> = self
            .dependencies
            .iter()
            .filter(|(scope, _)| scopes.contains(scope))
            .flat_map(|(_, coords)| coords.iter().cloned())
            .collect();
        set.into_iter().collect()
    }

    /// Project name, falling back to the project directory name.
    pub fn project_name(&self, project_root: &Utf8Path) -> String {
        self.project
            .name
            .clone()
            .or_else(|| project_root.file_name().map(str::to_string))
            .unwrap_or_else(|| "project".to_string())
    }

    /// Repository roots resolved against `project_root`.
    pub fn repository_roots(&self, project_root: &Utf8Path) -> Vec<(String, Utf8PathBuf)> {
        self.repositories
            .iter()
            .map(|r| {
                let path = if r.path.is_absolute() {
                    r.path.clone()
                } else {
                    project_root.join(&r.path)
                };
                (r.name.clone(), path)
            })
            .collect()
    }
}
