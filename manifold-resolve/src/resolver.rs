//! Transitive resolution.
//!
//! Each classpath is resolved on its own, breadth-first from the declared
//! roots. Conflicts between requested versions of the same module pick the
//! highest; managed modules and explicitly versioned roots are forced
//! instead. Runtime-only edges are followed only on classpaths that run code.
//!
//! Selections only ever move up, so re-walking the graph until no selection
//! changes terminates. The classpath is what the final walk reached.

use crate::error::ResolutionError;
use crate::source::{ArtifactSource, DependencyKind, ModuleMetadata};
use crate::version::{Version, VersionSelector};
use camino::Utf8PathBuf;
use manifold_descriptor::Descriptor;
use manifold_types::{Classpath, Coordinate, ModuleId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, info};

/// A module version that ended up on at least one classpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub coordinate: Coordinate,
    pub repository: String,
    /// Selected direct dependencies, sorted.
    pub dependencies: Vec<Coordinate>,
    pub artifact: Option<Utf8PathBuf>,
}

/// Outcome of a resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub packages: BTreeMap<Coordinate, ResolvedPackage>,
    /// Every classpath is present, possibly empty. Coordinates are sorted.
    pub classpaths: BTreeMap<Classpath, Vec<Coordinate>>,
}

impl Resolution {
    pub fn classpath(&self, cp: Classpath) -> &[Coordinate] {
        self.classpaths.get(&cp).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Result of one walk over the graph of a classpath.
#[derive(Default)]
struct Walk {
    /// Highest version requested per module during the walk.
    requested: BTreeMap<ModuleId, String>,
    /// Version each reached module was expanded at.
    expanded: BTreeMap<ModuleId, String>,
    /// Direct dependency modules of each expanded module.
    edges: BTreeMap<ModuleId, BTreeSet<ModuleId>>,
}

struct RootRequest {
    module: ModuleId,
    raw: String,
    explicit: bool,
}

pub struct Resolver<'a> {
    source: &'a dyn ArtifactSource,
    descriptor: &'a Descriptor,
    metadata: BTreeMap<Coordinate, ModuleMetadata>,
    concrete: BTreeMap<(ModuleId, String), String>,
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a dyn ArtifactSource, descriptor: &'a Descriptor) -> Self {
        Self {
            source,
            descriptor,
            metadata: BTreeMap::new(),
            concrete: BTreeMap::new(),
        }
    }

    /// Resolve every classpath.
    pub fn resolve(mut self) -> Result<Resolution, ResolutionError> {
        let mut resolution = Resolution::default();
        let mut package_edges: BTreeMap<Coordinate, BTreeSet<Coordinate>> = BTreeMap::new();

        for cp in Classpath::ALL {
            let walk = self.resolve_classpath(cp)?;
            let mut coordinates: Vec<Coordinate> = Vec::with_capacity(walk.expanded.len());
            for (id, version) in &walk.expanded {
                let coordinate = id.at(version);
                let deps = package_edges.entry(coordinate.clone()).or_default();
                for dep in walk.edges.get(id).into_iter().flatten() {
                    if let Some(dep_version) = walk.expanded.get(dep) {
                        deps.insert(dep.at(dep_version));
                    }
                }
                coordinates.push(coordinate);
            }
            debug!(classpath = %cp, packages = coordinates.len(), "resolved classpath");
            resolution.classpaths.insert(cp, coordinates);
        }

        for (coordinate, deps) in package_edges {
            let meta = self.metadata_for(&coordinate)?;
            let package = ResolvedPackage {
                coordinate: coordinate.clone(),
                repository: meta.repository.clone(),
                dependencies: deps.into_iter().collect(),
                artifact: meta.artifact.clone(),
            };
            resolution.packages.insert(coordinate, package);
        }

        info!(packages = resolution.packages.len(), "dependency resolution complete");
        Ok(resolution)
    }

    fn resolve_classpath(&mut self, cp: Classpath) -> Result<Walk, ResolutionError> {
        let roots = self.root_requests(cp)?;
        let forced = self.forced_versions(&roots)?;

        let mut pinned: BTreeMap<ModuleId, String> = BTreeMap::new();
        loop {
            let walk = self.walk(cp, &roots, &forced, &pinned)?;
            let mut changed = false;
            for (id, version) in &walk.requested {
                let raise = pinned
                    .get(id)
                    .is_none_or(|current| Version::parse(version) > Version::parse(current));
                if raise {
                    pinned.insert(id.clone(), version.clone());
                    changed = true;
                }
            }
            if !changed {
                return Ok(walk);
            }
        }
    }

    /// Declared roots of `cp` with their requested version strings.
    fn root_requests(&self, cp: Classpath) -> Result<Vec<RootRequest>, ResolutionError> {
        let mut out = Vec::new();
        for root in self.descriptor.roots(cp) {
            let module = root.module();
            let (raw, explicit) = match &root.version {
                Some(v) => (v.clone(), true),
                None => (self.managed(&module)?, false),
            };
            out.push(RootRequest {
                module,
                raw,
                explicit,
            });
        }
        Ok(out)
    }

    fn managed(&self, module: &ModuleId) -> Result<String, ResolutionError> {
        self.descriptor
            .dependency_management
            .get(module)
            .cloned()
            .ok_or_else(|| ResolutionError::UnmanagedVersion {
                module: module.clone(),
            })
    }

    /// Requested versions that override conflict resolution: every managed
    /// module, with explicitly versioned roots on top.
    fn forced_versions(
        &mut self,
        roots: &[RootRequest],
    ) -> Result<BTreeMap<ModuleId, String>, ResolutionError> {
        let mut forced = self.descriptor.dependency_management.clone();
        let mut explicit: BTreeMap<ModuleId, String> = BTreeMap::new();
        for root in roots.iter().filter(|r| r.explicit) {
            let v = self.concretize(&root.module, &root.raw)?;
            let higher = explicit
                .get(&root.module)
                .is_none_or(|cur| Version::parse(&v) > Version::parse(cur));
            if higher {
                explicit.insert(root.module.clone(), v);
            }
        }
        forced.extend(explicit);
        Ok(forced)
    }

    fn walk(
        &mut self,
        cp: Classpath,
        roots: &[RootRequest],
        forced: &BTreeMap<ModuleId, String>,
        pinned: &BTreeMap<ModuleId, String>,
    ) -> Result<Walk, ResolutionError> {
        let mut walk = Walk::default();
        let mut queue: VecDeque<ModuleId> = VecDeque::new();

        for root in roots {
            self.request(&mut walk, &root.module, &root.raw, forced)?;
            queue.push_back(root.module.clone());
        }

        while let Some(module) = queue.pop_front() {
            if walk.expanded.contains_key(&module) {
                continue;
            }
            let version = select(pinned.get(&module), walk.requested.get(&module));
            let Some(version) = version else {
                continue;
            };
            let coordinate = module.at(&version);
            let meta = self.metadata_for(&coordinate)?.clone();
            walk.expanded.insert(module.clone(), version);

            let mut deps = BTreeSet::new();
            for dep in &meta.dependencies {
                if dep.kind == DependencyKind::Runtime && !cp.includes_runtime_transitives() {
                    continue;
                }
                let dep_module = dep.coordinate.module();
                let raw = match &dep.coordinate.version {
                    Some(v) => v.clone(),
                    None => self.managed(&dep_module)?,
                };
                self.request(&mut walk, &dep_module, &raw, forced)?;
                deps.insert(dep_module.clone());
                queue.push_back(dep_module);
            }
            walk.edges.insert(module, deps);
        }
        Ok(walk)
    }

    /// Record a request for `module` at `raw`, keeping the highest.
    fn request(
        &mut self,
        walk: &mut Walk,
        module: &ModuleId,
        raw: &str,
        forced: &BTreeMap<ModuleId, String>,
    ) -> Result<(), ResolutionError> {
        let raw = forced.get(module).map(String::as_str).unwrap_or(raw);
        let version = self.concretize(module, raw)?;
        let higher = walk
            .requested
            .get(module)
            .is_none_or(|cur| Version::parse(&version) > Version::parse(cur));
        if higher {
            walk.requested.insert(module.clone(), version);
        }
        Ok(())
    }

    /// Turn a requested version string into a concrete, available version.
    fn concretize(&mut self, module: &ModuleId, raw: &str) -> Result<String, ResolutionError> {
        let key = (module.clone(), raw.to_string());
        if let Some(v) = self.concrete.get(&key) {
            return Ok(v.clone());
        }
        let selector = VersionSelector::parse(raw);
        let found = if selector.is_dynamic() {
            let available = self.source.versions(module).map_err(from_source)?;
            selector.select(&available).cloned()
        } else if self.lookup(&module.at(raw))?.is_some() {
            Some(raw.to_string())
        } else {
            None
        };
        match found {
            Some(v) => {
                if selector.is_dynamic() {
                    debug!(module = %module, requested = raw, selected = %v, "dynamic version selected");
                }
                self.concrete.insert(key, v.clone());
                Ok(v)
            }
            None => Err(self.missing(&module.at(raw))),
        }
    }

    /// Error for a coordinate no repository carries.
    fn missing(&self, coordinate: &Coordinate) -> ResolutionError {
        let module = coordinate.module();
        match self.source.versions(&module) {
            Ok(available) if !available.is_empty() => ResolutionError::UnknownVersion {
                coordinate: coordinate.clone(),
                available,
            },
            Ok(_) => ResolutionError::UnknownArtifact { module },
            Err(e) => from_source(e),
        }
    }

    fn lookup(&mut self, coordinate: &Coordinate) -> Result<Option<&ModuleMetadata>, ResolutionError> {
        if !self.metadata.contains_key(coordinate) {
            match self.source.metadata(coordinate).map_err(from_source)? {
                Some(meta) => {
                    self.metadata.insert(coordinate.clone(), meta);
                }
                None => return Ok(None),
            }
        }
        Ok(self.metadata.get(coordinate))
    }

    fn metadata_for(&mut self, coordinate: &Coordinate) -> Result<&ModuleMetadata, ResolutionError> {
        if self.lookup(coordinate)?.is_none() {
            return Err(self.missing(coordinate));
        }
        self.metadata
            .get(coordinate)
            .ok_or_else(|| ResolutionError::UnknownArtifact {
                module: coordinate.module(),
            })
    }
}

/// Sources report resolution failures through `anyhow`; keep their variant.
fn from_source(err: anyhow::Error) -> ResolutionError {
    match err.downcast::<ResolutionError>() {
        Ok(e) => e,
        Err(other) => ResolutionError::Io(other),
    }
}

fn select(pinned: Option<&String>, requested: Option<&String>) -> Option<String> {
    match (pinned, requested) {
        (Some(p), Some(r)) => Some(if Version::parse(r) > Version::parse(p) {
            r.clone()
        } else {
            p.clone()
        }),
        (Some(p), None) => Some(p.clone()),
        (None, Some(r)) => Some(r.clone()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{InMemoryRepository, ModuleDependency};
    use manifold_descriptor::parse_descriptor;
    use pretty_assertions::assert_eq;

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn descriptor(body: &str) -> Descriptor {
        let text = format!(
            "[toolchain]\nversion = 17\n\n[[repositories]]\nname = \"mem\"\npath = \"repo\"\n\n{body}"
        );
        parse_descriptor(&text, "test").unwrap()
    }

    fn names(res: &Resolution, cp: Classpath) -> Vec<String> {
        res.classpath(cp).iter().map(|c| c.to_string()).collect()
    }

    fn repo() -> InMemoryRepository {
        InMemoryRepository::new("mem")
            .with_module(
                coord("g:app-lib:1.0"),
                vec![
                    ModuleDependency::compile(coord("g:core:1.0")),
                    ModuleDependency::runtime(coord("g:driver:2.0")),
                ],
            )
            .with_module(coord("g:web:1.0"), vec![ModuleDependency::compile(coord("g:core:1.2"))])
            .with_module(coord("g:core:1.0"), vec![])
            .with_module(coord("g:core:1.2"), vec![])
            .with_module(coord("g:driver:2.0"), vec![])
    }

    #[test]
    fn highest_requested_version_wins() {
        let d = descriptor(
            r#"[dependencies]
implementation = ["g:app-lib:1.0", "g:web:1.0"]
"#,
        );
        let source = repo();
        let res = Resolver::new(&source, &d).resolve().unwrap();
        assert_eq!(names(&res, Classpath::Compile), vec!["g:app-lib:1.0", "g:core:1.2", "g:web:1.0"]);
        assert!(!res.packages.contains_key(&coord("g:core:1.0")));
        let app = &res.packages[&coord("g:app-lib:1.0")];
        assert_eq!(app.dependencies, vec![coord("g:core:1.2"), coord("g:driver:2.0")]);
    }

    #[test]
    fn runtime_edges_stay_off_compile_classpath() {
        let d = descriptor(
            r#"[dependencies]
implementation = ["g:app-lib:1.0"]
"#,
        );
        let source = repo();
        let res = Resolver::new(&source, &d).resolve().unwrap();
        assert!(!names(&res, Classpath::Compile).contains(&"g:driver:2.0".to_string()));
        assert!(names(&res, Classpath::Runtime).contains(&"g:driver:2.0".to_string()));
        assert!(names(&res, Classpath::TestRuntime).contains(&"g:driver:2.0".to_string()));
        assert!(!names(&res, Classpath::TestCompile).contains(&"g:driver:2.0".to_string()));
    }

    #[test]
    fn managed_version_is_forced_on_transitives() {
        let d = descriptor(
            r#"[dependencies]
implementation = ["g:web"]

[dependency_management]
"g:web" = "1.0"
"g:core" = "1.0"
"#,
        );
        let source = repo();
        let res = Resolver::new(&source, &d).resolve().unwrap();
        assert_eq!(names(&res, Classpath::Compile), vec!["g:core:1.0", "g:web:1.0"]);
    }

    #[test]
    fn explicit_root_version_overrides_management() {
        let d = descriptor(
            r#"[dependencies]
implementation = ["g:core:1.2"]

[dependency_management]
"g:core" = "1.0"
"#,
        );
        let source = repo();
        let res = Resolver::new(&source, &d).resolve().unwrap();
        assert_eq!(names(&res, Classpath::Compile), vec!["g:core:1.2"]);
    }

    #[test]
    fn unmanaged_root_is_an_error() {
        let d = descriptor(
            r#"[dependencies]
implementation = ["g:core"]
"#,
        );
        let source = repo();
        let err = Resolver::new(&source, &d).resolve().unwrap_err();
        assert!(matches!(err, ResolutionError::UnmanagedVersion { .. }), "{err}");
    }

    #[test]
    fn unknown_artifact_and_version_are_distinguished() {
        let source = repo();

        let d = descriptor("[dependencies]\nimplementation = [\"g:nope:1.0\"]\n");
        let err = Resolver::new(&source, &d).resolve().unwrap_err();
        assert!(matches!(err, ResolutionError::UnknownArtifact { .. }), "{err}");

        let d = descriptor("[dependencies]\nimplementation = [\"g:core:9.9\"]\n");
        let err = Resolver::new(&source, &d).resolve().unwrap_err();
        match err {
            ResolutionError::UnknownVersion { available, .. } => {
                assert_eq!(available, vec!["1.0", "1.2"]);
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn dynamic_versions_pick_highest_match() {
        let d = descriptor("[dependencies]\nimplementation = [\"g:core:1.+\"]\n");
        let source = repo();
        let res = Resolver::new(&source, &d).resolve().unwrap();
        assert_eq!(names(&res, Classpath::Compile), vec!["g:core:1.2"]);
    }

    #[test]
    fn upgrade_drops_edges_of_superseded_version() {
        // a:1 pulls b:1 -> x:1. c pulls b:2, which no longer needs x.
        let source = InMemoryRepository::new("mem")
            .with_module(coord("g:a:1"), vec![ModuleDependency::compile(coord("g:b:1"))])
            .with_module(coord("g:b:1"), vec![ModuleDependency::compile(coord("g:x:1"))])
            .with_module(coord("g:b:2"), vec![])
            .with_module(coord("g:c:1"), vec![ModuleDependency::compile(coord("g:d:1"))])
            .with_module(coord("g:d:1"), vec![ModuleDependency::compile(coord("g:b:2"))])
            .with_module(coord("g:x:1"), vec![]);
        let d = descriptor("[dependencies]\nimplementation = [\"g:a:1\", \"g:c:1\"]\n");
        let res = Resolver::new(&source, &d).resolve().unwrap();
        assert_eq!(
            names(&res, Classpath::Compile),
            vec!["g:a:1", "g:b:2", "g:c:1", "g:d:1"]
        );
    }

    #[test]
    fn every_classpath_is_present() {
        let d = descriptor("");
        let source = repo();
        let res = Resolver::new(&source, &d).resolve().unwrap();
        assert_eq!(res.classpaths.len(), Classpath::ALL.len());
        assert!(res.packages.is_empty());
    }
}
