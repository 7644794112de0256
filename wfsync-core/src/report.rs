//! Markdown synchronization report

use crate::models::{AnalysisResult, NewScenarioProposal, ScenarioName};
use crate::Result;
use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const REPORT_TITLE: &str = "BMAD Workflow ↔ Story Synchronization Report";
/// Commit recorded when the project is not a git checkout
pub const NO_GIT: &str = "NO_GIT";
const DRY_RUN_PREFIX: &str = "[DRY-RUN]-";
const MISSING: &str = "N/A";

/// Run metadata written into the report header
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub generated: DateTime<Local>,
    pub git_commit: String,
}

impl ReportContext {
    pub fn new(generated: DateTime<Local>, git_commit: impl Into<String>) -> Self {
        Self {
            generated,
            git_commit: git_commit.into(),
        }
    }
}

/// Action counts across all scenarios
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub deletions: usize,
    pub modifications: usize,
    pub additions: usize,
}

impl ReportSummary {
    pub fn from_results(results: &[(ScenarioName, AnalysisResult)]) -> Self {
        results.iter().fold(Self::default(), |acc, (_, result)| Self {
            deletions: acc.deletions + result.deletions.len(),
            modifications: acc.modifications + result.modifications.len(),
            additions: acc.additions + result.additions.len(),
        })
    }

    pub const fn total(&self) -> usize {
        self.deletions + self.modifications + self.additions
    }
}

fn or_missing(value: &str) -> &str {
    if value.trim().is_empty() {
        MISSING
    } else {
        value
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Render the full report. Scenarios appear in the order given.
pub fn render_report(
    results: &[(ScenarioName, AnalysisResult)],
    proposals: &[NewScenarioProposal],
    context: &ReportContext,
) -> String {
    let summary = ReportSummary::from_results(results);
    let mut lines: Vec<String> = vec![
        "---".into(),
        format!("title: {REPORT_TITLE}"),
        format!("generated: {}", context.generated.format("%Y-%m-%dT%H:%M:%S")),
        format!("git_commit: {}", context.git_commit),
        format!("total_actions: {}", summary.total()),
        "---".into(),
        String::new(),
        format!("# {REPORT_TITLE}"),
        String::new(),
        format!("**Generated:** {}", context.generated.format("%Y-%m-%d %H:%M:%S")),
        format!("**Git Commit:** `{}`", context.git_commit),
        String::new(),
        "## Summary".into(),
        String::new(),
        format!("- **Total Actions:** {}", summary.total()),
        format!("  - Stories to Delete: {}", summary.deletions),
        format!("  - Stories to Modify: {}", summary.modifications),
        format!("  - Stories to Add: {}", summary.additions),
        format!("- **New Scenarios Proposed:** {}", proposals.len()),
        String::new(),
    ];

    for (scenario, result) in results {
        render_scenario(&mut lines, scenario, result);
    }

    if !proposals.is_empty() {
        lines.push("## Proposed New Scenarios".into());
        lines.push(String::new());
        for proposal in proposals {
            lines.push(format!("### {}", proposal.scenario_name));
            lines.push(String::new());
            lines.push(format!("**Description:** {}", or_missing(&proposal.description)));
            lines.push(String::new());
            lines.push("**Suggested Stories:**".into());
            for story in &proposal.suggested_stories {
                lines.push(format!("- `{}`: {}", story.filename, or_missing(&story.summary)));
            }
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

fn render_scenario(lines: &mut Vec<String>, scenario: &ScenarioName, result: &AnalysisResult) {
    lines.push(format!("## Scenario: {scenario}"));
    lines.push(String::new());

    if !result.deletions.is_empty() {
        lines.push("### Stories to Delete".into());
        lines.push(String::new());
        for item in &result.deletions {
            lines.push(format!("- **{}**", item.file_path));
            lines.push(format!("  - Reason: {}", item.reason));
            if !item.affects_other_scenarios.is_empty() {
                lines.push(format!(
                    "  - ⚠️ **Also exists in:** {}",
                    join(&item.affects_other_scenarios)
                ));
            }
            lines.push(String::new());
        }
    }

    if !result.modifications.is_empty() {
        lines.push("### Stories to Modify".into());
        lines.push(String::new());
        for item in &result.modifications {
            lines.push(format!("#### {}", item.file_path));
            lines.push(String::new());
            lines.push(format!("**Current Summary:** {}", or_missing(&item.current_summary)));
            lines.push(String::new());
            if !item.affects_other_scenarios.is_empty() {
                lines.push(format!(
                    "⚠️ **Also exists in:** {}",
                    join(&item.affects_other_scenarios)
                ));
                lines.push(String::new());
            }
            lines.push("**Changes Needed:**".into());
            lines.extend(item.changes_needed.iter().map(|c| format!("- {c}")));
            lines.push(String::new());
            if !item.diff.is_empty() {
                lines.push("**Diff:**".into());
                lines.push("```diff".into());
                // Inner fences would close the block early
                lines.push(item.diff.replace("```", "\\`\\`\\`"));
                lines.push("```".into());
                lines.push(String::new());
            }
        }
    }

    if !result.additions.is_empty() {
        lines.push("### Stories to Add".into());
        lines.push(String::new());
        for item in &result.additions {
            lines.push(format!("#### New Story: {}", item.filename));
            lines.push(String::new());
            lines.push(format!(
                "**Wave:** {} | **Epic:** {} | **Story:** {}",
                or_missing(&item.wave),
                or_missing(&item.epic),
                or_missing(&item.story)
            ));
            lines.push(String::new());
            match item.target_scenarios.len() {
                0 => lines.push(format!("**Target Scenario:** {scenario}")),
                1 => lines.push(format!("**Target Scenario:** {}", join(&item.target_scenarios))),
                _ => lines.push(format!("**Target Scenarios:** {}", join(&item.target_scenarios))),
            }
            lines.push(String::new());
            lines.push(format!("**Summary:** {}", or_missing(&item.summary)));
            lines.push(String::new());
        }
    }
}

/// `workflow-sync-report-YYYY-MM-DD-HHMM.md`, prefixed in dry-run mode
pub fn report_filename(now: &DateTime<Local>, dry_run: bool) -> String {
    let name = format!("workflow-sync-report-{}.md", now.format("%Y-%m-%d-%H%M"));
    if dry_run {
        format!("{DRY_RUN_PREFIX}{name}")
    } else {
        name
    }
}

/// Write `content` to `output_dir/filename`, creating the directory
pub fn write_report(output_dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    wfsync_utils::ensure_dir(output_dir)?;
    let path = output_dir.join(filename);
    tracing::info!("Generating report at {}", path.display());
    std::fs::write(&path, content)?;
    tracing::info!("Report generated: {}", path.display());
    Ok(path)
}

/// Current `HEAD` commit of the repository at `project_root`
pub fn git_commit(project_root: &Path) -> String {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(project_root)
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if commit.is_empty() {
                NO_GIT.to_string()
            } else {
                commit
            }
        }
        Ok(_) => NO_GIT.to_string(),
        Err(e) => {
            tracing::debug!("git unavailable: {e}");
            NO_GIT.to_string()
        }
    }
}
