//! The build pipeline: resolve, compile, generate, test.
//!
//! Each phase is callable on its own; [`run_build`] runs the selected phases
//! in order, stops at the first failure, and records every phase in a
//! [`BuildReport`]. Writes go through [`WritePort`], child processes through
//! [`ProcessLauncher`], and artifact metadata through [`ArtifactSource`].

use crate::error::{BuildError, PhaseError};
use crate::ports::WritePort;
use crate::settings::BuildSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use manifold_codegen::{check_output, generate, render_drift, stale_files};
use manifold_descriptor::Descriptor;
use manifold_render::render_report_md;
use manifold_resolve::{
    ArtifactSource, LOCKFILE_NAME, ResolutionError, Resolver, check_locked, is_fresh,
    lockfile_from, lockfile_json, read_lockfile,
};
use manifold_testrun::{
    CLASSPATH_ENV, EngineRegistry, ProcessLauncher, ProcessSpec, TestExecutionError, TestRun,
    run_tests, verify_toolchain,
};
use manifold_types::Classpath;
use manifold_types::lock::Lockfile;
use manifold_types::report::{BuildReport, Phase, PhaseOutcome, PhaseStatus, ProjectInfo, ToolInfo};
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Separator between classpath entries handed to child processes.
pub const CLASSPATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Everything the pipeline talks to.
#[derive(Clone, Copy)]
pub struct Ports<'a> {
    pub artifacts: &'a dyn ArtifactSource,
    pub launcher: &'a dyn ProcessLauncher,
    pub writer: &'a dyn WritePort,
    pub engines: &'a EngineRegistry,
}

#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub lockfile: Lockfile,
    /// The existing lockfile was used as-is.
    pub reused: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOutcome {
    /// Detected runtime major version, when a probe is configured.
    pub toolchain: Option<u32>,
    pub command: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOutcome {
    /// No `[codegen]` task is configured.
    pub skipped: bool,
    pub package_dir: Option<Utf8PathBuf>,
    /// Written (or, in check mode, verified) files.
    pub files: Vec<Utf8PathBuf>,
    pub removed: Vec<Utf8PathBuf>,
    pub schema_files: Vec<Utf8PathBuf>,
}

/// Entries of `cp` that have an artifact file, joined for a child process.
pub fn classpath_string(lock: &Lockfile, cp: Classpath) -> String {
    lock.artifact_paths(cp)
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(CLASSPATH_SEPARATOR)
}

/// Use the lockfile when it is fresh, otherwise resolve and rewrite it.
///
/// With `settings.locked` the lockfile must exist and be fresh.
pub fn resolve_phase(
    settings: &BuildSettings,
    descriptor: &Descriptor,
    ports: Ports<'_>,
) -> Result<ResolveOutcome, ResolutionError> {
    let lock_path = settings.project_root.join(LOCKFILE_NAME);
    let existing = read_lockfile(&lock_path)?;

    if settings.locked {
        let lockfile = check_locked(existing, descriptor)?;
        debug!(path = %lock_path, "using locked resolution");
        return Ok(ResolveOutcome {
            lockfile,
            reused: true,
        });
    }
    if let Some(lockfile) = existing.filter(|l| is_fresh(l, descriptor)) {
        debug!(path = %lock_path, "lockfile is fresh; skipping resolution");
        return Ok(ResolveOutcome {
            lockfile,
            reused: true,
        });
    }

    let resolution = Resolver::new(ports.artifacts, descriptor).resolve()?;
    let lockfile = lockfile_from(descriptor, &resolution);
    let json = lockfile_json(&lockfile)?;
    ports.writer.write_file(&lock_path, json.as_bytes())?;
    info!(
        packages = lockfile.packages.len(),
        path = %lock_path,
        "lockfile written"
    );
    Ok(ResolveOutcome {
        lockfile,
        reused: false,
    })
}

/// Verify the toolchain pin, then run `[compile] command` if configured.
pub fn compile_phase(
    settings: &BuildSettings,
    descriptor: &Descriptor,
    lock: &Lockfile,
    ports: Ports<'_>,
) -> Result<CompileOutcome, PhaseError> {
    let toolchain = verify_toolchain(ports.launcher, &settings.project_root, &descriptor.toolchain)?;
    let Some(argv) = descriptor.compile.command.as_deref() else {
        debug!("no compile command configured");
        return Ok(CompileOutcome {
            toolchain,
            command: None,
        });
    };
    let spec = ProcessSpec::from_argv(argv, &settings.project_root)
        .context("[compile] command is empty")?
        .env(CLASSPATH_ENV, classpath_string(lock, Classpath::Compile))
        .envs(&descriptor.compile.env);
    let command = spec.display();
    let code = ports
        .launcher
        .run(&spec)
        .with_context(|| format!("run compile command `{command}`"))?;
    if code != Some(0) {
        return Err(PhaseError::CompileFailed { command, code });
    }
    Ok(CompileOutcome {
        toolchain,
        command: Some(command),
    })
}

/// Generate client sources, or with `settings.check_generated` verify that
/// the files on disk are current.
pub fn generate_phase(
    settings: &BuildSettings,
    descriptor: &Descriptor,
    ports: Ports<'_>,
) -> Result<GenerateOutcome, PhaseError> {
    let Some(task) = &descriptor.codegen else {
        info!("no [codegen] task configured");
        return Ok(GenerateOutcome {
            skipped: true,
            ..GenerateOutcome::default()
        });
    };
    let output = generate(&settings.project_root, task)?;
    let files: Vec<Utf8PathBuf> = output.files.iter().map(|f| output.path_of(f)).collect();

    if settings.check_generated {
        let drift = check_output(&output)?;
        if !drift.is_empty() {
            return Err(PhaseError::GeneratedDrift {
                count: drift.len(),
                diff: render_drift(&drift),
            });
        }
        return Ok(GenerateOutcome {
            skipped: false,
            package_dir: Some(output.package_dir.clone()),
            files,
            removed: Vec::new(),
            schema_files: output.schema_files.clone(),
        });
    }

    let stale = stale_files(&output)?;
    ports.writer.create_dir_all(&output.package_dir)?;
    for (file, path) in output.files.iter().zip(&files) {
        ports.writer.write_file(path, file.contents.as_bytes())?;
    }
    for path in &stale {
        debug!(path = %path, "removing stale generated file");
        ports.writer.remove_file(path)?;
    }
    info!(
        files = files.len(),
        removed = stale.len(),
        dir = %output.package_dir,
        "sources generated"
    );
    Ok(GenerateOutcome {
        skipped: false,
        package_dir: Some(output.package_dir),
        files,
        removed: stale,
        schema_files: output.schema_files,
    })
}

/// Run the configured test engine against the test runtime classpath.
pub fn test_phase(
    settings: &BuildSettings,
    descriptor: &Descriptor,
    lock: &Lockfile,
    ports: Ports<'_>,
) -> Result<TestRun, TestExecutionError> {
    run_tests(
        ports.launcher,
        ports.engines,
        &settings.project_root,
        &descriptor.test,
        &classpath_string(lock, Classpath::TestRuntime),
        &settings.test_args,
    )
}

/// Result of [`run_build`]. The report is complete even when a phase failed.
#[derive(Debug)]
pub struct BuildOutcome {
    pub report: BuildReport,
    pub lockfile: Option<Lockfile>,
    pub error: Option<BuildError>,
}

impl BuildOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

struct Completed {
    status: PhaseStatus,
    message: Option<String>,
    details: serde_json::Value,
}

impl Completed {
    fn passed(details: serde_json::Value) -> Self {
        Self {
            status: PhaseStatus::Passed,
            message: None,
            details,
        }
    }
}

pub fn project_info(settings: &BuildSettings, descriptor: &Descriptor) -> ProjectInfo {
    ProjectInfo {
        group: descriptor.project.group.clone(),
        name: descriptor.project_name(&settings.project_root),
        version: descriptor.project.version.clone(),
        root: settings.project_root.to_string(),
    }
}

/// Run the phases selected in `settings`, in order.
///
/// The first failing phase stops the build; phases after it are recorded as
/// skipped. Phases that need a classpath obtain the lockfile on their own
/// when `resolve` is not selected.
pub fn run_build(
    settings: &BuildSettings,
    descriptor: &Descriptor,
    ports: Ports<'_>,
    tool: ToolInfo,
) -> BuildOutcome {
    let mut report = BuildReport::new(tool, project_info(settings, descriptor));
    let mut lock: Option<Lockfile> = None;
    let mut error: Option<BuildError> = None;

    for phase in Phase::ORDER {
        if !settings.runs(phase) {
            continue;
        }
        if error.is_some() {
            report.phases.push(PhaseOutcome {
                phase,
                status: PhaseStatus::Skipped,
                duration_ms: 0,
                message: Some("skipped after an earlier failure".to_string()),
                details: None,
            });
            continue;
        }

        let started = Instant::now();
        let result = run_phase(phase, settings, descriptor, ports, &mut lock);
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(done) => {
                info!(phase = %phase, duration_ms, "phase finished");
                report.phases.push(PhaseOutcome {
                    phase,
                    status: done.status,
                    duration_ms,
                    message: done.message,
                    details: Some(done.details),
                });
            }
            Err(source) => {
                warn!(phase = %phase, error = %source, "phase failed");
                let details = source.child_exit_code().map(|code| json!({ "exit_code": code }));
                report.phases.push(PhaseOutcome {
                    phase,
                    status: PhaseStatus::Failed,
                    duration_ms,
                    message: Some(source.to_string()),
                    details,
                });
                error = Some(BuildError::new(phase, source));
            }
        }
    }

    report.finish();
    BuildOutcome {
        report,
        lockfile: lock,
        error,
    }
}

fn run_phase(
    phase: Phase,
    settings: &BuildSettings,
    descriptor: &Descriptor,
    ports: Ports<'_>,
    lock: &mut Option<Lockfile>,
) -> Result<Completed, PhaseError> {
    match phase {
        Phase::Resolve => {
            let out = resolve_phase(settings, descriptor, ports)?;
            let details = json!({
                "packages": out.lockfile.packages.len(),
                "reused_lockfile": out.reused,
                "fingerprint": out.lockfile.fingerprint,
                "plugins": out.lockfile.plugins,
            });
            *lock = Some(out.lockfile);
            Ok(Completed::passed(details))
        }
        Phase::Compile => {
            let lockfile = ensure_lock(settings, descriptor, ports, lock)?;
            let out = compile_phase(settings, descriptor, lockfile, ports)?;
            let mut details = json!({
                "classpath_entries": lockfile.classpath(Classpath::Compile).len(),
            });
            if let Some(version) = out.toolchain {
                details["toolchain_version"] = json!(version);
            }
            if let Some(command) = out.command {
                details["command"] = json!(command);
            }
            Ok(Completed::passed(details))
        }
        Phase::Generate => {
            let out = generate_phase(settings, descriptor, ports)?;
            if out.skipped {
                return Ok(Completed {
                    status: PhaseStatus::Skipped,
                    message: Some("no [codegen] task configured".to_string()),
                    details: json!({}),
                });
            }
            let root = &settings.project_root;
            Ok(Completed::passed(json!({
                "files": relative_all(root, &out.files),
                "removed": relative_all(root, &out.removed),
                "schemas": relative_all(root, &out.schema_files),
                "checked": settings.check_generated,
            })))
        }
        Phase::Test => {
            let lockfile = ensure_lock(settings, descriptor, ports, lock)?;
            let run = test_phase(settings, descriptor, lockfile, ports)?;
            Ok(Completed::passed(json!({
                "engine": run.engine,
                "command": run.command.join(" "),
                "exit_code": run.exit_code,
            })))
        }
    }
}

fn ensure_lock<'l>(
    settings: &BuildSettings,
    descriptor: &Descriptor,
    ports: Ports<'_>,
    lock: &'l mut Option<Lockfile>,
) -> Result<&'l Lockfile, PhaseError> {
    let lockfile = match lock.take() {
        Some(l) => l,
        None => resolve_phase(settings, descriptor, ports)?.lockfile,
    };
    Ok(lock.insert(lockfile))
}

fn relative_all(root: &Utf8Path, paths: &[Utf8PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.strip_prefix(root).unwrap_or(p).to_string())
        .collect()
}

/// Write `report.json` and `report.md` into `out_dir`.
pub fn write_build_artifacts(
    report: &BuildReport,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;
    let mut json = serde_json::to_string_pretty(report).context("serialize report")?;
    json.push('\n');
    writer.write_file(&out_dir.join("report.json"), json.as_bytes())?;
    writer.write_file(&out_dir.join("report.md"), render_report_md(report).as_bytes())?;
    Ok(())
}
