use manifold_types::lock::{LockedPackage, Lockfile};
use manifold_types::report::{
    BuildReport, Phase, PhaseOutcome, PhaseStatus, ProjectInfo, ToolInfo, VerdictStatus,
};
use manifold_types::{Classpath, Coordinate};
use pretty_assertions::assert_eq;

fn tool() -> ToolInfo {
    ToolInfo {
        name: "manifold".to_string(),
        version: Some("0.1.0".to_string()),
        commit: None,
    }
}

fn project() -> ProjectInfo {
    ProjectInfo {
        group: Some("spindox.CIAMS".to_string()),
        name: "auth-service".to_string(),
        version: Some("1.0".to_string()),
        root: "/repo".to_string(),
    }
}

fn outcome(phase: Phase, status: PhaseStatus, message: Option<&str>) -> PhaseOutcome {
    PhaseOutcome {
        phase,
        status,
        duration_ms: 0,
        message: message.map(str::to_string),
        details: None,
    }
}

#[test]
fn report_new_sets_schema_and_unknown_verdict() {
    let report = BuildReport::new(tool(), project());
    assert_eq!(report.schema, manifold_types::schema::MANIFOLD_REPORT_V1);
    assert!(report.phases.is_empty());
    assert_eq!(report.verdict.status, VerdictStatus::Unknown);
    assert!(report.run.ended_at.is_none());
}

#[test]
fn finish_passes_when_no_phase_failed() {
    let mut report = BuildReport::new(tool(), project());
    report.phases.push(outcome(Phase::Resolve, PhaseStatus::Passed, None));
    report.phases.push(outcome(Phase::Test, PhaseStatus::Skipped, None));
    report.finish();

    assert_eq!(report.verdict.status, VerdictStatus::Pass);
    assert!(report.verdict.failed_phase.is_none());
    assert!(report.run.ended_at.is_some());
}

#[test]
fn finish_names_the_first_failed_phase() {
    let mut report = BuildReport::new(tool(), project());
    report.phases.push(outcome(Phase::Resolve, PhaseStatus::Passed, None));
    report.phases.push(outcome(
        Phase::Generate,
        PhaseStatus::Failed,
        Some("no schema files"),
    ));
    report.phases.push(outcome(Phase::Test, PhaseStatus::Skipped, None));
    report.finish();

    assert_eq!(report.verdict.status, VerdictStatus::Fail);
    assert_eq!(report.verdict.failed_phase, Some(Phase::Generate));
    assert_eq!(report.verdict.reasons, vec!["no schema files".to_string()]);
}

#[test]
fn report_json_uses_snake_case_enums() {
    let mut report = BuildReport::new(tool(), project());
    report.phases.push(outcome(Phase::Resolve, PhaseStatus::Passed, None));
    report.finish();

    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["phases"][0]["phase"], "resolve");
    assert_eq!(v["phases"][0]["status"], "passed");
    assert_eq!(v["verdict"]["status"], "pass");
    assert!(v["verdict"].get("failed_phase").is_none());
}

#[test]
fn lockfile_classpath_lookup_and_artifacts() {
    let web: Coordinate = "org.springframework:spring-web:7.0.3".parse().unwrap();
    let lombok: Coordinate = "org.projectlombok:lombok:1.18.42".parse().unwrap();

    let mut lock = Lockfile::new("abc");
    lock.packages.push(LockedPackage {
        coordinate: lombok.clone(),
        repository: "local".to_string(),
        dependencies: vec![],
        artifact: None,
    });
    lock.packages.push(LockedPackage {
        coordinate: web.clone(),
        repository: "local".to_string(),
        dependencies: vec![],
        artifact: Some("repo/spring-web-7.0.3.jar".into()),
    });
    lock.classpaths
        .insert(Classpath::Compile, vec![lombok.clone(), web.clone()]);

    assert_eq!(lock.classpath(Classpath::Compile).len(), 2);
    assert!(lock.classpath(Classpath::Runtime).is_empty());
    assert_eq!(
        lock.artifact_paths(Classpath::Compile),
        vec![camino::Utf8PathBuf::from("repo/spring-web-7.0.3.jar")]
    );

    let json = serde_json::to_string(&lock).unwrap();
    assert!(json.contains("\"compile\""));
    let back: Lockfile = serde_json::from_str(&json).unwrap();
    assert_eq!(back, lock);
}
