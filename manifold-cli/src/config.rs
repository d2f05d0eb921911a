//! Descriptor loading for the CLI.
//!
//! The descriptor is the configuration. Flags given on the command line take
//! precedence over the values it declares, and the merged result is
//! validated again before any phase runs.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use manifold_descriptor::{
    DESCRIPTOR_FILE_NAME, Descriptor, DescriptorError, TestEngineKind, load_descriptor, validate,
};
use manifold_types::Classpath;
use tracing::debug;

/// Project location as given on the command line, made absolute.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: Utf8PathBuf,
    pub descriptor_path: Utf8PathBuf,
}

impl Project {
    /// `descriptor` defaults to `<root>/manifold.toml`; a relative
    /// `descriptor` is taken from the current directory.
    pub fn locate(root: &Utf8Path, descriptor: Option<&Utf8Path>) -> anyhow::Result<Self> {
        let cwd = current_dir()?;
        let root = absolutize(&cwd, root);
        let descriptor_path = match descriptor {
            Some(path) => absolutize(&cwd, path),
            None => root.join(DESCRIPTOR_FILE_NAME),
        };
        debug!(root = %root, descriptor = %descriptor_path, "project located");
        Ok(Self {
            root,
            descriptor_path,
        })
    }

    pub fn load(&self, overrides: &Overrides) -> Result<Descriptor, DescriptorError> {
        if !self.descriptor_path.is_file() {
            return Err(DescriptorError::NotFound {
                path: self.descriptor_path.clone(),
            });
        }
        let descriptor = load_descriptor(&self.descriptor_path)?;
        ConfigMerger::new(descriptor).merge(overrides)
    }
}

fn current_dir() -> anyhow::Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().context("read current directory")?;
    Utf8PathBuf::from_path_buf(cwd)
        .map_err(|p| anyhow::anyhow!("current directory is not UTF-8: {}", p.display()))
}

fn absolutize(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else if path.as_str() == "." {
        base.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Descriptor values that can be replaced from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Replaces `[codegen] package_name`.
    pub package_name: Option<String>,

    /// Replaces `[test] engine`.
    pub engine: Option<TestEngineKind>,
}

/// Applies [`Overrides`] on top of a loaded descriptor.
pub struct ConfigMerger {
    descriptor: Descriptor,
}

impl ConfigMerger {
    pub fn new(descriptor: Descriptor) -> Self {
        Self { descriptor }
    }

    /// CLI values win. The result is re-validated, so an override can make
    /// an otherwise valid descriptor invalid.
    pub fn merge(self, overrides: &Overrides) -> Result<Descriptor, DescriptorError> {
        let mut descriptor = self.descriptor;

        if let Some(package) = &overrides.package_name {
            let Some(codegen) = descriptor.codegen.as_mut() else {
                return Err(DescriptorError::Invalid {
                    key: "codegen.package_name".to_string(),
                    message: "--package-name given but no [codegen] task is configured"
                        .to_string(),
                });
            };
            debug!(from = %codegen.package_name, to = %package, "overriding package name");
            codegen.package_name = package.clone();
        }
        if let Some(engine) = overrides.engine {
            debug!(engine = engine.as_str(), "overriding test engine");
            descriptor.test.engine = engine;
        }

        validate(&descriptor)?;
        Ok(descriptor)
    }
}

pub fn parse_engine(s: &str) -> Result<TestEngineKind, String> {
    [
        TestEngineKind::JunitPlatform,
        TestEngineKind::Cargo,
        TestEngineKind::Command,
    ]
    .into_iter()
    .find(|e| e.as_str() == s)
    .ok_or_else(|| format!("unknown test engine '{s}' (expected junit-platform, cargo or command)"))
}

pub fn parse_classpath(s: &str) -> Result<Classpath, String> {
    s.parse()
}
