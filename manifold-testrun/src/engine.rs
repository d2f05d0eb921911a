//! Test engines, looked up by name.

use crate::error::TestExecutionError;

/// Jar launched by the `junit-platform` engine when no command is configured.
pub const JUNIT_CONSOLE_JAR: &str = "junit-platform-console-standalone.jar";

/// What an engine needs to build its command line.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    /// `[test] command`, replacing the engine default.
    pub command: Option<&'a [String]>,
    /// Test runtime classpath, joined with the platform separator.
    pub classpath: &'a str,
    /// Appended after the engine's own arguments.
    pub extra_args: &'a [String],
}

pub trait TestEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Command line used when `[test] command` is not set.
    fn default_command(&self, classpath: &str) -> Result<Vec<String>, TestExecutionError>;

    fn command_line(&self, req: &EngineRequest<'_>) -> Result<Vec<String>, TestExecutionError> {
        let mut argv = match req.command {
            Some(cmd) => cmd.to_vec(),
            None => self.default_command(req.classpath)?,
        };
        if argv.is_empty() {
            return Err(TestExecutionError::EmptyCommand {
                engine: self.name().to_string(),
            });
        }
        argv.extend(req.extra_args.iter().cloned());
        Ok(argv)
    }
}

/// JUnit Platform console launcher, scanning the test classpath.
#[derive(Debug, Clone, Copy, Default)]
pub struct JunitPlatformEngine;

impl TestEngine for JunitPlatformEngine {
    fn name(&self) -> &'static str {
        "junit-platform"
    }

    fn default_command(&self, classpath: &str) -> Result<Vec<String>, TestExecutionError> {
        let mut argv: Vec<String> = ["java", "-jar", JUNIT_CONSOLE_JAR, "execute", "--scan-class-path"]
            .into_iter()
            .map(String::from)
            .collect();
        if !classpath.is_empty() {
            argv.push("--class-path".to_string());
            argv.push(classpath.to_string());
        }
        Ok(argv)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CargoEngine;

impl TestEngine for CargoEngine {
    fn name(&self) -> &'static str {
        "cargo"
    }

    fn default_command(&self, _classpath: &str) -> Result<Vec<String>, TestExecutionError> {
        Ok(vec!["cargo".to_string(), "test".to_string()])
    }
}

/// Runs whatever `[test] command` says; there is no default.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandEngine;

impl TestEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    fn default_command(&self, _classpath: &str) -> Result<Vec<String>, TestExecutionError> {
        Err(TestExecutionError::MissingCommand {
            engine: self.name().to_string(),
        })
    }
}

/// Name -> engine table.
pub struct EngineRegistry {
    engines: Vec<Box<dyn TestEngine>>,
}

impl EngineRegistry {
    pub fn empty() -> Self {
        Self {
            engines: Vec::new(),
        }
    }

    pub fn builtin() -> Self {
        Self::empty()
            .with(JunitPlatformEngine)
            .with(CargoEngine)
            .with(CommandEngine)
    }

    /// Register `engine`, replacing any engine with the same name.
    pub fn with(mut self, engine: impl TestEngine + 'static) -> Self {
        self.engines.retain(|e| e.name() != engine.name());
        self.engines.push(Box::new(engine));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn TestEngine> {
        self.engines
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.engines.iter().map(|e| e.name()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
