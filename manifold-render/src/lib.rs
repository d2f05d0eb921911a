//! Rendering helpers (markdown and plain text) for human-readable output.

use manifold_types::lock::Lockfile;
use manifold_types::report::{BuildReport, PhaseOutcome, PhaseStatus, VerdictStatus};
use manifold_types::{Classpath, Coordinate};
use std::collections::{BTreeMap, BTreeSet};

pub fn render_report_md(report: &BuildReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# manifold build: {}\n\n", report.project.name));
    out.push_str(&format!(
        "- Verdict: `{}`\n",
        verdict_label(report.verdict.status)
    ));
    if let Some(phase) = report.verdict.failed_phase {
        out.push_str(&format!("- Failed phase: `{}`\n", phase));
    }
    out.push_str(&format!("- Build id: `{}`\n", report.run.build_id));
    out.push_str(&format!(
        "- Started: {}\n",
        report.run.started_at.format("%Y-%m-%dT%H:%M:%SZ")
    ));
    if let Some(ms) = report.run.duration_ms {
        out.push_str(&format!("- Duration: {} ms\n", ms));
    }
    if let Some(version) = &report.tool.version {
        out.push_str(&format!("- Tool: {} {}\n", report.tool.name, version));
    }
    out.push('\n');

    out.push_str("## Phases\n\n");
    if report.phases.is_empty() {
        out.push_str("_No phases ran._\n");
        return out;
    }
    out.push_str("| Phase | Status | Duration |\n|---|---|---|\n");
    for p in &report.phases {
        out.push_str(&format!(
            "| {} | {} | {} ms |\n",
            p.phase,
            status_label(p.status),
            p.duration_ms
        ));
    }

    for p in report.phases.iter().filter(|p| has_notes(p)) {
        out.push_str(&format!("\n### {}\n\n", p.phase));
        if let Some(msg) = &p.message {
            out.push_str(&format!("{}\n", msg));
        }
        if let Some(details) = &p.details {
            let lines = detail_lines(details);
            if !lines.is_empty() {
                if p.message.is_some() {
                    out.push('\n');
                }
                for line in lines {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
        }
    }

    if !report.verdict.reasons.is_empty() {
        out.push_str("\n## Reasons\n\n");
        for r in &report.verdict.reasons {
            out.push_str(&format!("- {}\n", r));
        }
    }

    out
}

fn has_notes(p: &PhaseOutcome) -> bool {
    p.message.is_some() || p.details.as_ref().is_some_and(|d| !detail_lines(d).is_empty())
}

/// One bullet per top-level key; scalars inline, anything else as JSON.
fn detail_lines(details: &serde_json::Value) -> Vec<String> {
    let Some(map) = details.as_object() else {
        return vec![format!("- `{}`", details)];
    };
    map.iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => format!("- {}: `{}`", k, s),
            serde_json::Value::Array(items) if items.iter().all(|i| i.is_string()) => {
                let joined: Vec<String> = items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .map(|s| format!("`{}`", s))
                    .collect();
                format!("- {}: {}", k, joined.join(", "))
            }
            other => format!("- {}: `{}`", k, other),
        })
        .collect()
}

fn status_label(s: PhaseStatus) -> &'static str {
    match s {
        PhaseStatus::Passed => "passed",
        PhaseStatus::Failed => "failed",
        PhaseStatus::Skipped => "skipped",
    }
}

fn verdict_label(s: VerdictStatus) -> &'static str {
    match s {
        VerdictStatus::Pass => "pass",
        VerdictStatus::Fail => "fail",
        VerdictStatus::Unknown => "unknown",
    }
}

/// One coordinate per line, in classpath order.
pub fn render_classpath(lock: &Lockfile, cp: Classpath) -> String {
    lock.classpath(cp)
        .iter()
        .map(|c| format!("{c}\n"))
        .collect()
}

/// Gradle-style dependency tree for `cp`.
///
/// `roots` are the declared coordinates feeding the classpath; a managed or
/// upgraded root shows `requested -> resolved`. A subtree already printed is
/// marked `(*)` instead of being expanded again.
pub fn render_dependency_tree(lock: &Lockfile, cp: Classpath, roots: &[Coordinate]) -> String {
    let on_classpath: BTreeMap<(String, String), &Coordinate> = lock
        .classpath(cp)
        .iter()
        .map(|c| ((c.group.clone(), c.artifact.clone()), c))
        .collect();

    let mut out = format!("{}\n", cp.as_str());
    let visible: Vec<(&Coordinate, &Coordinate)> = roots
        .iter()
        .filter_map(|r| {
            on_classpath
                .get(&(r.group.clone(), r.artifact.clone()))
                .map(|resolved| (r, *resolved))
        })
        .collect();
    if visible.is_empty() {
        out.push_str("\\--- (none)\n");
        return out;
    }

    let mut expanded: BTreeSet<&Coordinate> = BTreeSet::new();
    let last = visible.len() - 1;
    for (i, (requested, resolved)) in visible.into_iter().enumerate() {
        let label = edge_label(requested, resolved);
        tree_node(lock, &on_classpath, resolved, label, "", i == last, &mut expanded, &mut out);
    }
    out
}

fn edge_label(requested: &Coordinate, resolved: &Coordinate) -> String {
    match (&requested.version, &resolved.version) {
        (Some(r), Some(v)) if r == v => resolved.to_string(),
        (_, Some(v)) => format!("{} -> {}", requested, v),
        _ => resolved.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn tree_node<'a>(
    lock: &'a Lockfile,
    on_classpath: &BTreeMap<(String, String), &'a Coordinate>,
    node: &'a Coordinate,
    label: String,
    prefix: &str,
    is_last: bool,
    expanded: &mut BTreeSet<&'a Coordinate>,
    out: &mut String,
) {
    let branch = if is_last { "\\--- " } else { "+--- " };
    let children: Vec<&'a Coordinate> = lock
        .package(node)
        .map(|p| {
            p.dependencies
                .iter()
                .filter_map(|d| on_classpath.get(&(d.group.clone(), d.artifact.clone())).copied())
                .collect()
        })
        .unwrap_or_default();

    if !children.is_empty() && !expanded.insert(node) {
        out.push_str(&format!("{prefix}{branch}{label} (*)\n"));
        return;
    }
    out.push_str(&format!("{prefix}{branch}{label}\n"));

    let child_prefix = format!("{prefix}{}", if is_last { "     " } else { "|    " });
    let last = children.len().saturating_sub(1);
    for (i, child) in children.into_iter().enumerate() {
        tree_node(
            lock,
            on_classpath,
            child,
            child.to_string(),
            &child_prefix,
            i == last,
            expanded,
            out,
        );
    }
}
