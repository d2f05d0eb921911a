use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use manifold_cli::config::{Overrides, Project, parse_classpath, parse_engine};
use manifold_core::adapters::{FsWritePort, repository_chain};
use manifold_core::pipeline::{
    BuildOutcome, Ports, classpath_string, resolve_phase, run_build, write_build_artifacts,
};
use manifold_core::settings::BuildSettings;
use manifold_core::{EngineRegistry, Phase, SystemLauncher, ToolInfo};
use manifold_descriptor::{Descriptor, DescriptorError, TestEngineKind};
use manifold_render::{render_classpath, render_dependency_tree};
use manifold_types::Classpath;
use manifold_types::lock::Lockfile;
use manifold_types::report::PhaseStatus;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Exit status when a phase fails.
const EXIT_PHASE_FAILED: u8 = 1;
/// Exit status for an invalid descriptor (clap uses the same for usage errors).
const EXIT_INVALID_DESCRIPTOR: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "manifold",
    version,
    about = "Descriptor-driven builds: locked dependency resolution, GraphQL client codegen, delegated tests."
)]
struct Cli {
    /// Project root (default: current directory).
    #[arg(long, global = true, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Descriptor file (default: <project_root>/manifold.toml).
    #[arg(long, global = true)]
    descriptor: Option<Utf8PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run resolve, compile, generate and test, in that order.
    Build(BuildArgs),
    /// Resolve dependencies and write manifold.lock.
    Resolve(ResolveArgs),
    /// Print the coordinates (or artifact paths) of one classpath.
    Classpath(ClasspathArgs),
    /// Print the resolved dependency tree.
    Dependencies(DependenciesArgs),
    /// Generate GraphQL client sources.
    Generate(GenerateArgs),
    /// Run the configured test engine.
    Test(TestArgs),
    /// Validate the descriptor without running any phase.
    Check,
}

#[derive(Debug, Args)]
struct ReportArgs {
    /// Output directory for report.json and report.md (default: <project_root>/build/manifold).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Skip writing report artifacts.
    #[arg(long, default_value_t = false)]
    no_report: bool,
}

#[derive(Debug, Args)]
struct BuildArgs {
    /// Fail if manifold.lock is missing or out of date instead of re-resolving.
    #[arg(long, default_value_t = false)]
    locked: bool,

    /// Fail if generated sources differ from what the schema produces.
    #[arg(long, default_value_t = false)]
    check_generated: bool,

    /// Override `[codegen] package_name`.
    #[arg(long)]
    package_name: Option<String>,

    /// Override `[test] engine` (junit-platform, cargo, command).
    #[arg(long, value_parser = parse_engine)]
    engine: Option<TestEngineKind>,

    #[command(flatten)]
    report: ReportArgs,

    /// Extra arguments appended to the test engine command line.
    #[arg(last = true)]
    test_args: Vec<String>,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Fail if manifold.lock is missing or out of date instead of re-resolving.
    #[arg(long, default_value_t = false)]
    locked: bool,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Debug, Args)]
struct ClasspathArgs {
    /// Classpath name (compile, runtime, test-compile, test-runtime,
    /// annotation-processor, development).
    #[arg(value_parser = parse_classpath)]
    name: Classpath,

    /// Print artifact paths joined for a JVM `-cp` argument.
    #[arg(long, default_value_t = false)]
    paths: bool,

    #[arg(long, default_value_t = false)]
    locked: bool,
}

#[derive(Debug, Args)]
struct DependenciesArgs {
    /// Only this classpath (default: all of them).
    #[arg(long, value_parser = parse_classpath)]
    classpath: Option<Classpath>,

    #[arg(long, default_value_t = false)]
    locked: bool,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Verify generated sources instead of writing them.
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Override `[codegen] package_name`.
    #[arg(long)]
    package_name: Option<String>,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Debug, Args)]
struct TestArgs {
    #[arg(long, default_value_t = false)]
    locked: bool,

    /// Override `[test] engine` (junit-platform, cargo, command).
    #[arg(long, value_parser = parse_engine)]
    engine: Option<TestEngineKind>,

    #[command(flatten)]
    report: ReportArgs,

    /// Extra arguments appended to the test engine command line.
    #[arg(last = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn exit_code_for(e: &anyhow::Error) -> u8 {
    if e.chain().any(|cause| cause.is::<DescriptorError>()) {
        EXIT_INVALID_DESCRIPTOR
    } else {
        EXIT_PHASE_FAILED
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let project = Project::locate(&cli.project_root, cli.descriptor.as_deref())?;

    match cli.cmd {
        Command::Build(args) => cmd_build(&project, args),
        Command::Resolve(args) => cmd_resolve(&project, args),
        Command::Classpath(args) => cmd_classpath(&project, args),
        Command::Dependencies(args) => cmd_dependencies(&project, args),
        Command::Generate(args) => cmd_generate(&project, args),
        Command::Test(args) => cmd_test(&project, args),
        Command::Check => cmd_check(&project),
    }
}

fn cmd_build(project: &Project, args: BuildArgs) -> anyhow::Result<ExitCode> {
    let descriptor = project.load(&Overrides {
        package_name: args.package_name,
        engine: args.engine,
    })?;
    let settings = BuildSettings {
        locked: args.locked,
        check_generated: args.check_generated,
        test_args: args.test_args,
        ..report_settings(project, &args.report)
    };
    run_phases(&settings, &descriptor)
}

fn cmd_resolve(project: &Project, args: ResolveArgs) -> anyhow::Result<ExitCode> {
    let descriptor = project.load(&Overrides::default())?;
    let settings = BuildSettings {
        locked: args.locked,
        ..report_settings(project, &args.report)
    }
    .only(&[Phase::Resolve]);
    run_phases(&settings, &descriptor)
}

fn cmd_generate(project: &Project, args: GenerateArgs) -> anyhow::Result<ExitCode> {
    let descriptor = project.load(&Overrides {
        package_name: args.package_name,
        ..Overrides::default()
    })?;
    let settings = BuildSettings {
        check_generated: args.check,
        ..report_settings(project, &args.report)
    }
    .only(&[Phase::Generate]);
    run_phases(&settings, &descriptor)
}

fn cmd_test(project: &Project, args: TestArgs) -> anyhow::Result<ExitCode> {
    let descriptor = project.load(&Overrides {
        engine: args.engine,
        ..Overrides::default()
    })?;
    let settings = BuildSettings {
        locked: args.locked,
        test_args: args.args,
        ..report_settings(project, &args.report)
    }
    .only(&[Phase::Test]);
    run_phases(&settings, &descriptor)
}

fn cmd_classpath(project: &Project, args: ClasspathArgs) -> anyhow::Result<ExitCode> {
    let descriptor = project.load(&Overrides::default())?;
    let lock = lockfile(project, &descriptor, args.locked)?;
    if args.paths {
        println!("{}", classpath_string(&lock, args.name));
    } else {
        print!("{}", render_classpath(&lock, args.name));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_dependencies(project: &Project, args: DependenciesArgs) -> anyhow::Result<ExitCode> {
    let descriptor = project.load(&Overrides::default())?;
    let lock = lockfile(project, &descriptor, args.locked)?;
    let selected: Vec<Classpath> = match args.classpath {
        Some(cp) => vec![cp],
        None => Classpath::ALL.to_vec(),
    };
    let trees: Vec<String> = selected
        .into_iter()
        .map(|cp| render_dependency_tree(&lock, cp, &descriptor.roots(cp)))
        .collect();
    print!("{}", trees.join("\n"));
    Ok(ExitCode::SUCCESS)
}

fn cmd_check(project: &Project) -> anyhow::Result<ExitCode> {
    let descriptor = project.load(&Overrides::default())?;
    println!(
        "{}: ok (dependencies: {}, repositories: {})",
        project.descriptor_path,
        descriptor.declarations().len(),
        descriptor.repositories.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn report_settings(project: &Project, report: &ReportArgs) -> BuildSettings {
    let mut settings = BuildSettings::for_root(project.root.clone());
    if let Some(out_dir) = &report.out_dir {
        settings.out_dir = out_dir.clone();
    }
    settings.write_report = !report.no_report;
    settings
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "manifold".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        commit: option_env!("MANIFOLD_GIT_SHA").map(str::to_string),
    }
}

fn run_phases(settings: &BuildSettings, descriptor: &Descriptor) -> anyhow::Result<ExitCode> {
    let repositories = repository_chain(descriptor, &settings.project_root);
    let launcher = SystemLauncher;
    let writer = FsWritePort;
    let engines = EngineRegistry::builtin();
    let ports = Ports {
        artifacts: &repositories,
        launcher: &launcher,
        writer: &writer,
        engines: &engines,
    };

    debug!(phases = ?settings.phases, root = %settings.project_root, "starting build");
    let outcome = run_build(settings, descriptor, ports, tool_info());

    if settings.write_report {
        let out_dir = settings.resolved_out_dir();
        write_build_artifacts(&outcome.report, &out_dir, &writer)
            .with_context(|| format!("write report to {}", out_dir))?;
        info!(out_dir = %out_dir, "report written");
    }

    print_summary(&outcome);
    match &outcome.error {
        None => Ok(ExitCode::SUCCESS),
        Some(err) => {
            error!("{}", err);
            Ok(ExitCode::from(EXIT_PHASE_FAILED))
        }
    }
}

fn print_summary(outcome: &BuildOutcome) {
    for p in &outcome.report.phases {
        let status = match p.status {
            PhaseStatus::Passed => "passed",
            PhaseStatus::Failed => "FAILED",
            PhaseStatus::Skipped => "skipped",
        };
        println!("{:<9} {:<8} {} ms", p.phase.as_str(), status, p.duration_ms);
        if let Some(message) = &p.message {
            println!("          {}", message);
        }
    }
}

/// The lockfile for read-only commands, resolving when needed.
fn lockfile(project: &Project, descriptor: &Descriptor, locked: bool) -> anyhow::Result<Lockfile> {
    let settings = BuildSettings {
        locked,
        write_report: false,
        ..BuildSettings::for_root(project.root.clone())
    };
    let repositories = repository_chain(descriptor, &settings.project_root);
    let launcher = SystemLauncher;
    let writer = FsWritePort;
    let engines = EngineRegistry::builtin();
    let ports = Ports {
        artifacts: &repositories,
        launcher: &launcher,
        writer: &writer,
        engines: &engines,
    };
    let outcome = resolve_phase(&settings, descriptor, ports).context("resolve failed")?;
    Ok(outcome.lockfile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn descriptor_errors_map_to_exit_code_two() {
        let err = anyhow::Error::new(DescriptorError::NotFound {
            path: Utf8PathBuf::from("/p/manifold.toml"),
        })
        .context("load project");
        assert_eq!(exit_code_for(&err), EXIT_INVALID_DESCRIPTOR);
        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), EXIT_PHASE_FAILED);
    }

    #[test]
    fn trailing_arguments_reach_the_test_engine() {
        let cli = Cli::try_parse_from(["manifold", "test", "--engine", "cargo", "--", "--nocapture"])
            .expect("parse");
        match cli.cmd {
            Command::Test(args) => {
                assert_eq!(args.engine, Some(TestEngineKind::Cargo));
                assert_eq!(args.args, vec!["--nocapture"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["manifold", "check", "--project-root", "svc"]).expect("parse");
        assert_eq!(cli.project_root, "svc");
        assert!(matches!(cli.cmd, Command::Check));
    }
}
