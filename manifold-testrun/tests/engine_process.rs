//! End-to-end runs through the system launcher.
#![cfg(unix)]

use camino::Utf8PathBuf;
use manifold_descriptor::{TestEngineKind, TestTask};
use manifold_testrun::{EngineRegistry, SystemLauncher, TestExecutionError, run_tests};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn command_task(script: &str) -> TestTask {
    TestTask {
        engine: TestEngineKind::Command,
        command: Some(vec!["sh".to_string(), "-c".to_string(), script.to_string()]),
        env: BTreeMap::new(),
    }
}

fn root(temp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
}

#[test]
fn passing_suite_returns_zero() {
    let temp = TempDir::new().unwrap();
    let run = run_tests(
        &SystemLauncher,
        &EngineRegistry::builtin(),
        &root(&temp),
        &command_task("test \"$MANIFOLD_CLASSPATH\" = lib/a.jar"),
        "lib/a.jar",
        &[],
    )
    .unwrap();
    assert_eq!(run.exit_code, 0);
}

#[test]
fn failing_suite_propagates_exit_code() {
    let temp = TempDir::new().unwrap();
    let err = run_tests(
        &SystemLauncher,
        &EngineRegistry::builtin(),
        &root(&temp),
        &command_task("exit 4"),
        "",
        &[],
    )
    .unwrap_err();
    assert!(matches!(err, TestExecutionError::Failed { code: Some(4), .. }), "{err}");
}

#[test]
fn engine_runs_in_the_project_root() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("marker"), "").unwrap();
    let result = run_tests(
        &SystemLauncher,
        &EngineRegistry::builtin(),
        &root(&temp),
        &command_task("test -f marker"),
        "",
        &[],
    );
    assert!(result.is_ok(), "{result:?}");
}
