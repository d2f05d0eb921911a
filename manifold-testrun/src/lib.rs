//! Test execution and toolchain checks.
//!
//! Engines are resolved by name from an [`EngineRegistry`] and run as child
//! processes through the [`ProcessLauncher`] port, so the pipeline can be
//! exercised without spawning anything.

mod engine;
mod error;
mod process;
mod runner;
mod toolchain;

pub use engine::{
    CargoEngine, CommandEngine, EngineRegistry, EngineRequest, JUNIT_CONSOLE_JAR,
    JunitPlatformEngine, TestEngine,
};
pub use error::{TestExecutionError, ToolchainError};
pub use process::{CapturedOutput, ProcessLauncher, ProcessSpec, ScriptedLauncher, SystemLauncher};
pub use runner::{CLASSPATH_ENV, TestRun, run_tests};
pub use toolchain::{parse_major_version, verify_toolchain};
