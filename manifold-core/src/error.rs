use manifold_codegen::CodegenError;
use manifold_resolve::ResolutionError;
use manifold_testrun::{TestExecutionError, ToolchainError};
use manifold_types::report::Phase;
use thiserror::Error;

/// Why a phase failed.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("compile command `{command}` exited with {}", describe_exit(*code))]
    CompileFailed { command: String, code: Option<i32> },

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error("{count} generated file(s) are out of date; run `manifold generate`")]
    GeneratedDrift { count: usize, diff: String },

    #[error(transparent)]
    Test(#[from] TestExecutionError),

    #[error("{0:#}")]
    Io(#[from] anyhow::Error),
}

impl PhaseError {
    /// Exit code of the child process behind this failure, if any.
    pub fn child_exit_code(&self) -> Option<i32> {
        match self {
            PhaseError::CompileFailed { code, .. } => *code,
            PhaseError::Test(e) => e.exit_code(),
            _ => None,
        }
    }
}

/// A failed phase, as surfaced to callers.
#[derive(Debug, Error)]
#[error("{phase} failed: {source}")]
pub struct BuildError {
    pub phase: Phase,
    #[source]
    pub source: PhaseError,
}

impl BuildError {
    pub fn new(phase: Phase, source: impl Into<PhaseError>) -> Self {
        Self {
            phase,
            source: source.into(),
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
