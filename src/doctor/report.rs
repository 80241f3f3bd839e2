//! Markdown rendering for doctor reports

use super::DoctorReport;
use std::fmt::Write as _;

/// Renders the report as Markdown
#[must_use]
pub fn render_markdown(report: &DoctorReport) -> String {
    let mut out = String::from("# Preflight Doctor Report\n\n");
    let _ = writeln!(out, "Health: **{}**\n", report.summary);

    out.push_str("## Checks\n\n| Check | Status | Notes |\n|-------|--------|-------|\n");
    for check in &report.checks {
        let status = if check.passed { "✅" } else { "❌" };
        let note = check.output.lines().next().unwrap_or_default().trim();
        let _ = writeln!(out, "| {} | {status} | {note} |", check.name);
    }

    if !report.quickfixes.is_empty() {
        out.push_str("\n## Quick Fix Suggestions\n\n");
        for fix in &report.quickfixes {
            let _ = writeln!(out, "- {fix}");
        }
    }

    out.push_str("\n## How to Re-run\n\n```bash\npreflight doctor\n```\n");
    out
}
