use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use fs_err as fs;
use manifold_descriptor::{DESCRIPTOR_FILE_NAME, load_from_root};
use std::process::Command as ProcessCommand;

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Workspace helper tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print schema identifiers used by manifold.
    PrintSchemas,
    /// Load and validate every fixture descriptor under tests/fixtures.
    ValidateFixtures {
        #[arg(long, default_value = "tests/fixtures")]
        dir: Utf8PathBuf,
    },
    /// Run the cucumber acceptance suite.
    Bdd,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::PrintSchemas => {
            println!("{}", manifold_types::schema::MANIFOLD_LOCK_V1);
            println!("{}", manifold_types::schema::MANIFOLD_REPORT_V1);
        }
        Command::ValidateFixtures { dir } => {
            let checked = validate_fixtures(&dir)?;
            println!("{checked} fixture descriptor(s) valid");
        }
        Command::Bdd => {
            let status = ProcessCommand::new("cargo")
                .args(["test", "-p", "manifold-bdd", "--test", "cucumber"])
                .status()
                .context("run cucumber suite")?;
            if !status.success() {
                anyhow::bail!("bdd failed");
            }
        }
    }
    Ok(())
}

/// Every directory under `dir` holding a descriptor must load cleanly.
fn validate_fixtures(dir: &Utf8Path) -> anyhow::Result<usize> {
    let mut projects: Vec<Utf8PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = Utf8PathBuf::from_path_buf(entry?.path())
            .map_err(|p| anyhow::anyhow!("non UTF-8 path {}", p.display()))?;
        if path.join(DESCRIPTOR_FILE_NAME).is_file() {
            projects.push(path);
        }
    }
    projects.sort();

    for project in &projects {
        load_from_root(project).with_context(|| format!("fixture {project}"))?;
        println!("ok {project}");
    }
    Ok(projects.len())
}
