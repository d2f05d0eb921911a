//! Child-process port and its adapters.

use anyhow::Context;
use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use tracing::debug;

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Utf8PathBuf,
    /// Added to the inherited environment.
    pub env: BTreeMap<String, String>,
}

impl ProcessSpec {
    /// Split `argv` into program and arguments; `None` when empty.
    pub fn from_argv(argv: &[String], cwd: impl Into<Utf8PathBuf>) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: cwd.into(),
            env: BTreeMap::new(),
        })
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Space-joined command line, for messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a probe-style process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs child processes.
pub trait ProcessLauncher {
    /// Run with inherited stdio and return the exit code (`None` when killed
    /// by a signal). An error means the process could not be started.
    fn run(&self, spec: &ProcessSpec) -> anyhow::Result<Option<i32>>;

    /// Run with captured stdout/stderr.
    fn capture(&self, spec: &ProcessSpec) -> anyhow::Result<CapturedOutput>;
}

/// Launches real processes via `std::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    fn command(spec: &ProcessSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).current_dir(&spec.cwd).envs(&spec.env);
        cmd
    }
}

impl ProcessLauncher for SystemLauncher {
    fn run(&self, spec: &ProcessSpec) -> anyhow::Result<Option<i32>> {
        debug!(command = %spec.display(), cwd = %spec.cwd, "spawning");
        let status = Self::command(spec)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("spawn `{}` in {}", spec.display(), spec.cwd))?;
        Ok(status.code())
    }

    fn capture(&self, spec: &ProcessSpec) -> anyhow::Result<CapturedOutput> {
        debug!(command = %spec.display(), cwd = %spec.cwd, "capturing");
        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawn `{}` in {}", spec.display(), spec.cwd))?;
        Ok(CapturedOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Launcher that records every spec and answers from a script.
///
/// Programs without a scripted answer exit `0` with empty output; programs
/// listed via [`ScriptedLauncher::unavailable`] fail to spawn.
#[derive(Debug, Default)]
pub struct ScriptedLauncher {
    exits: BTreeMap<String, Option<i32>>,
    outputs: BTreeMap<String, CapturedOutput>,
    missing: Vec<String>,
    calls: Mutex<Vec<ProcessSpec>>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit(mut self, program: impl Into<String>, code: Option<i32>) -> Self {
        self.exits.insert(program.into(), code);
        self
    }

    pub fn output(mut self, program: impl Into<String>, output: CapturedOutput) -> Self {
        self.outputs.insert(program.into(), output);
        self
    }

    pub fn unavailable(mut self, program: impl Into<String>) -> Self {
        self.missing.push(program.into());
        self
    }

    /// Every spec seen so far, in call order.
    pub fn calls(&self) -> Vec<ProcessSpec> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, spec: &ProcessSpec) -> anyhow::Result<()> {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(spec.clone()),
            Err(poisoned) => poisoned.into_inner().push(spec.clone()),
        }
        if self.missing.contains(&spec.program) {
            anyhow::bail!("{}: program not found", spec.program);
        }
        Ok(())
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn run(&self, spec: &ProcessSpec) -> anyhow::Result<Option<i32>> {
        self.record(spec)?;
        Ok(self.exits.get(&spec.program).copied().unwrap_or(Some(0)))
    }

    fn capture(&self, spec: &ProcessSpec) -> anyhow::Result<CapturedOutput> {
        self.record(spec)?;
        Ok(self.outputs.get(&spec.program).cloned().unwrap_or(CapturedOutput {
            code: Some(0),
            ..CapturedOutput::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn from_argv_splits_program() {
        let spec = ProcessSpec::from_argv(&argv(&["cargo", "test", "-q"]), "/p").unwrap();
        assert_eq!(spec.program, "cargo");
        assert_eq!(spec.args, argv(&["test", "-q"]));
        assert_eq!(spec.display(), "cargo test -q");
        assert!(ProcessSpec::from_argv(&[], "/p").is_none());
    }

    #[test]
    fn scripted_launcher_records_and_answers() {
        let launcher = ScriptedLauncher::new().exit("false", Some(1)).unavailable("nope");
        let spec = ProcessSpec::from_argv(&argv(&["false"]), "/p").unwrap();
        assert_eq!(launcher.run(&spec).unwrap(), Some(1));

        let missing = ProcessSpec::from_argv(&argv(&["nope"]), "/p").unwrap();
        assert!(launcher.run(&missing).is_err());
        assert_eq!(launcher.calls().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn system_launcher_reports_exit_codes() {
        let temp = tempfile::TempDir::new().unwrap();
        let cwd = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let ok = ProcessSpec::from_argv(&argv(&["sh", "-c", "exit 0"]), cwd.clone()).unwrap();
        let bad = ProcessSpec::from_argv(&argv(&["sh", "-c", "exit 3"]), cwd.clone()).unwrap();
        assert_eq!(SystemLauncher.run(&ok).unwrap(), Some(0));
        assert_eq!(SystemLauncher.run(&bad).unwrap(), Some(3));

        let echo = ProcessSpec::from_argv(&argv(&["sh", "-c", "echo \"$GREETING\""]), cwd)
            .unwrap()
            .env("GREETING", "hello");
        assert_eq!(SystemLauncher.capture(&echo).unwrap().stdout, "hello\n");
    }

    #[test]
    fn system_launcher_fails_to_spawn_unknown_program() {
        let spec = ProcessSpec::from_argv(&argv(&["manifold-definitely-not-installed"]), ".").unwrap();
        assert!(SystemLauncher.run(&spec).is_err());
    }
}
