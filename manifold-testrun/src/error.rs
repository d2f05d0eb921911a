use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestExecutionError {
    #[error("test engine '{engine}' failed: `{command}` exited with {}", describe_exit(*code))]
    Failed {
        engine: String,
        command: String,
        code: Option<i32>,
    },

    #[error("test engine '{engine}' could not be started: `{command}`: {message}")]
    Spawn {
        engine: String,
        command: String,
        message: String,
    },

    #[error("test engine '{engine}' needs an explicit [test] command")]
    MissingCommand { engine: String },

    #[error("test engine '{engine}' has an empty command line")]
    EmptyCommand { engine: String },
}

impl TestExecutionError {
    /// Exit code to propagate from the CLI, when the engine produced one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            TestExecutionError::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("toolchain mismatch: {language} {expected} is pinned but `{probe}` reports {found}")]
    Mismatch {
        language: String,
        expected: u32,
        found: u32,
        probe: String,
    },

    #[error("could not read a {language} version from `{probe}` output: {output:?}")]
    Unrecognized {
        language: String,
        probe: String,
        output: String,
    },

    #[error("toolchain probe `{probe}` could not be run: {message}")]
    Probe { probe: String, message: String },

    #[error("toolchain probe `{probe}` failed with {}: {output:?}", describe_exit(*code))]
    ProbeFailed {
        probe: String,
        code: Option<i32>,
        output: String,
    },
}

pub(crate) fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
