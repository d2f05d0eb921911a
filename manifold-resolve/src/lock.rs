use crate::error::ResolutionError;
use crate::resolver::Resolution;
use anyhow::Context;
use camino::Utf8Path;
use fs_err as fs;
use manifold_descriptor::Descriptor;
use manifold_hash::sha256_fields;
use manifold_types::lock::{LockedPackage, Lockfile};
use manifold_types::schema::MANIFOLD_LOCK_V1;
use tracing::debug;

/// Lockfile name, next to the descriptor.
pub const LOCKFILE_NAME: &str = "manifold.lock";

/// Hash of every descriptor input that influences resolution: plugins,
/// repositories, declarations, dependency management and configuration
/// inheritance. Codegen and test settings are deliberately left out.
pub fn fingerprint(descriptor: &Descriptor) -> String {
    let mut fields: Vec<String> = vec![MANIFOLD_LOCK_V1.to_string()];
    for (id, version) in &descriptor.plugins {
        fields.push(format!("plugin {id} {version}"));
    }
    for repo in &descriptor.repositories {
        fields.push(format!("repository {} {}", repo.name, repo.path));
    }
    for dep in descriptor.declarations() {
        fields.push(format!("dependency {} {}", dep.scope, dep.coordinate));
    }
    for (module, version) in &descriptor.dependency_management {
        fields.push(format!("managed {module} {version}"));
    }
    for (scope, decl) in &descriptor.configurations {
        let parents: Vec<&str> = decl.extends_from.iter().map(|s| s.as_str()).collect();
        fields.push(format!("configuration {scope} {}", parents.join(",")));
    }
    sha256_fields(fields)
}

/// Build the lockfile recording `resolution`.
pub fn lockfile_from(descriptor: &Descriptor, resolution: &Resolution) -> Lockfile {
    let mut lock = Lockfile::new(fingerprint(descriptor));
    lock.plugins = descriptor.plugins.clone();
    lock.packages = resolution
        .packages
        .values()
        .map(|p| LockedPackage {
            coordinate: p.coordinate.clone(),
            repository: p.repository.clone(),
            dependencies: p.dependencies.clone(),
            artifact: p.artifact.clone(),
        })
        .collect();
    lock.classpaths = resolution.classpaths.clone();
    lock
}

/// Read `path`, or `None` when it does not exist.
pub fn read_lockfile(path: &Utf8Path) -> anyhow::Result<Option<Lockfile>> {
    if !path.is_file() {
        debug!(path = %path, "no lockfile");
        return Ok(None);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path))?;
    let lock: Lockfile =
        serde_json::from_str(&contents).with_context(|| format!("parse lockfile {}", path))?;
    Ok(Some(lock))
}

/// Pretty JSON with a trailing newline, stable across runs.
pub fn lockfile_json(lock: &Lockfile) -> anyhow::Result<String> {
    let mut out = serde_json::to_string_pretty(lock).context("serialize lockfile")?;
    out.push('\n');
    Ok(out)
}

/// Whether `lock` still describes `descriptor`.
pub fn is_fresh(lock: &Lockfile, descriptor: &Descriptor) -> bool {
    lock.schema == MANIFOLD_LOCK_V1 && lock.fingerprint == fingerprint(descriptor)
}

/// Frozen mode: the lockfile must exist and be fresh.
pub fn check_locked(
    lock: Option<Lockfile>,
    descriptor: &Descriptor,
) -> Result<Lockfile, ResolutionError> {
    match lock {
        None => Err(ResolutionError::LockMismatch {
            reason: "missing".to_string(),
        }),
        Some(lock) if lock.schema != MANIFOLD_LOCK_V1 => Err(ResolutionError::LockMismatch {
            reason: format!("using unsupported schema '{}'", lock.schema),
        }),
        Some(lock) if !is_fresh(&lock, descriptor) => Err(ResolutionError::LockMismatch {
            reason: "out of date with manifold.toml".to_string(),
        }),
        Some(lock) => Ok(lock),
    }
}
