//! Delegated test execution.

use crate::engine::{EngineRegistry, EngineRequest};
use crate::error::TestExecutionError;
use crate::process::{ProcessLauncher, ProcessSpec};
use camino::Utf8Path;
use manifold_descriptor::TestTask;
use serde::Serialize;
use tracing::{info, warn};

/// Environment variable carrying the classpath handed to child processes.
pub const CLASSPATH_ENV: &str = "MANIFOLD_CLASSPATH";

/// A finished, successful engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRun {
    pub engine: String,
    pub command: Vec<String>,
    pub exit_code: i32,
}

/// Run the configured engine in `project_root`.
///
/// Succeeds iff the engine process exits with status zero.
pub fn run_tests(
    launcher: &dyn ProcessLauncher,
    registry: &EngineRegistry,
    project_root: &Utf8Path,
    task: &TestTask,
    classpath: &str,
    extra_args: &[String],
) -> Result<TestRun, TestExecutionError> {
    let name = task.engine.as_str();
    let engine = registry
        .get(name)
        .ok_or_else(|| TestExecutionError::Spawn {
            engine: name.to_string(),
            command: String::new(),
            message: format!("no engine named '{name}' is registered"),
        })?;

    let argv = engine.command_line(&EngineRequest {
        command: task.command.as_deref(),
        classpath,
        extra_args,
    })?;
    let spec = ProcessSpec::from_argv(&argv, project_root)
        .ok_or_else(|| TestExecutionError::EmptyCommand {
            engine: name.to_string(),
        })?
        .env(CLASSPATH_ENV, classpath)
        .envs(&task.env);
    let command = spec.display();

    info!(engine = name, command = %command, "running tests");
    let code = launcher
        .run(&spec)
        .map_err(|err| TestExecutionError::Spawn {
            engine: name.to_string(),
            command: command.clone(),
            message: format!("{err:#}"),
        })?;

    match code {
        Some(0) => Ok(TestRun {
            engine: name.to_string(),
            command: argv,
            exit_code: 0,
        }),
        code => {
            warn!(engine = name, ?code, "test engine reported failures");
            Err(TestExecutionError::Failed {
                engine: name.to_string(),
                command,
                code,
            })
        }
    }
}
