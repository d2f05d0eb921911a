//! Clap-free settings for a pipeline run.

use camino::{Utf8Path, Utf8PathBuf};
use manifold_types::report::Phase;

/// Report directory, relative to the project root.
pub const DEFAULT_OUT_DIR: &str = "build/manifold";

#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub project_root: Utf8PathBuf,

    /// Where `report.json` and `report.md` go. Relative paths are taken
    /// from the project root.
    pub out_dir: Utf8PathBuf,

    /// Phases to run; always executed in [`Phase::ORDER`].
    pub phases: Vec<Phase>,

    /// Fail instead of re-resolving when the lockfile is missing or stale.
    pub locked: bool,

    /// Report generated-source drift instead of writing.
    pub check_generated: bool,

    /// Appended to the test engine command line.
    pub test_args: Vec<String>,

    pub write_report: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            out_dir: Utf8PathBuf::from(DEFAULT_OUT_DIR),
            phases: Phase::ORDER.to_vec(),
            locked: false,
            check_generated: false,
            test_args: Vec::new(),
            write_report: true,
        }
    }
}

impl BuildSettings {
    pub fn for_root(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Restrict the run to `phases`.
    pub fn only(mut self, phases: &[Phase]) -> Self {
        self.phases = phases.to_vec();
        self
    }

    pub fn runs(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }

    pub fn resolved_out_dir(&self) -> Utf8PathBuf {
        absolutize(&self.project_root, &self.out_dir)
    }
}

pub(crate) fn absolutize(root: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
