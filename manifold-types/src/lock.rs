use crate::{Classpath, Coordinate};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// On-disk lock state (`manifold.lock`).
///
/// The fingerprint covers every descriptor input that influences resolution.
/// While it matches, the lockfile is authoritative and resolution is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub schema: String,

    pub fingerprint: String,

    /// Plugin id -> version, recorded as declared.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, String>,

    /// Every resolved package, sorted by coordinate.
    #[serde(default)]
    pub packages: Vec<LockedPackage>,

    /// Resolved coordinates per classpath, sorted.
    #[serde(default)]
    pub classpaths: BTreeMap<Classpath, Vec<Coordinate>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub coordinate: Coordinate,

    /// Name of the repository the metadata was read from.
    pub repository: String,

    /// Direct dependencies after conflict resolution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Coordinate>,

    /// Artifact file, when the repository carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Utf8PathBuf>,
}

impl Lockfile {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            schema: crate::schema::MANIFOLD_LOCK_V1.to_string(),
            fingerprint: fingerprint.into(),
            plugins: BTreeMap::new(),
            packages: Vec::new(),
            classpaths: BTreeMap::new(),
        }
    }

    pub fn classpath(&self, cp: Classpath) -> &[Coordinate] {
        self.classpaths.get(&cp).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn package(&self, coordinate: &Coordinate) -> Option<&LockedPackage> {
        self.packages.iter().find(|p| &p.coordinate == coordinate)
    }

    /// Artifact files on `cp`, in classpath order. Packages without an
    /// artifact file are left out.
    pub fn artifact_paths(&self, cp: Classpath) -> Vec<Utf8PathBuf> {
        self.classpath(cp)
            .iter()
            .filter_map(|c| self.package(c))
            .filter_map(|p| p.artifact.clone())
            .collect()
    }
}
