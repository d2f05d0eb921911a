use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Build phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Resolve,
    Compile,
    Generate,
    Test,
}

impl Phase {
    pub const ORDER: [Phase; 4] = [Phase::Resolve, Phase::Compile, Phase::Generate, Phase::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Resolve => "resolve",
            Phase::Compile => "compile",
            Phase::Generate => "generate",
            Phase::Test => "test",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub build_id: Uuid,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub root: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: Phase,

    pub status: PhaseStatus,

    #[serde(default)]
    pub duration_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Phase-specific payload (resolved package counts, generated files, exit code).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Pass,
    Fail,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<Phase>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

/// Outcome of one `manifold` invocation (`build/manifold/report.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub schema: String,
    pub tool: ToolInfo,
    pub run: RunInfo,
    pub project: ProjectInfo,

    #[serde(default)]
    pub phases: Vec<PhaseOutcome>,

    #[serde(default)]
    pub verdict: Verdict,
}

impl BuildReport {
    pub fn new(tool: ToolInfo, project: ProjectInfo) -> Self {
        Self {
            schema: crate::schema::MANIFOLD_REPORT_V1.to_string(),
            tool,
            run: RunInfo {
                build_id: Uuid::new_v4(),
                started_at: Utc::now(),
                ended_at: None,
                duration_ms: None,
            },
            project,
            phases: Vec::new(),
            verdict: Verdict::default(),
        }
    }

    pub fn outcome(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Stamp the end time and derive the verdict from the recorded phases.
    pub fn finish(&mut self) {
        let ended = Utc::now();
        self.run.duration_ms = Some(
            (ended - self.run.started_at)
                .num_milliseconds()
                .max(0) as u64,
        );
        self.run.ended_at = Some(ended);

        let failed = self
            .phases
            .iter()
            .find(|p| p.status == PhaseStatus::Failed);
        self.verdict = match failed {
            Some(outcome) => Verdict {
                status: VerdictStatus::Fail,
                failed_phase: Some(outcome.phase),
                reasons: outcome.message.iter().cloned().collect(),
            },
            None => Verdict {
                status: VerdictStatus::Pass,
                failed_phase: None,
                reasons: Vec::new(),
            },
        };
    }
}
