//! Gate result rendering: stable JSON form and human summaries

use super::runner::Verdict;
use super::{GateResult, GateStatus};
use serde::Serialize;
use std::fmt::Write as _;

/// JSON-ready view of a [`GateResult`]
///
/// Consumers always get display-ready execution fields: a PASS with no
/// process reports return code 0, and missing stdout falls back to the
/// details text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateResultJson {
    /// Task label
    pub gate: String,
    /// True iff PASS
    pub ok: bool,
    /// PASS, FAIL or SKIPPED
    pub status: GateStatus,
    /// Short summary
    pub info: String,
    /// Long explanation
    pub details: String,
    /// Exit code, if known
    pub returncode: Option<i32>,
    /// Captured or substituted stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl From<&GateResult> for GateResultJson {
    fn from(result: &GateResult) -> Self {
        let returncode = match (result.returncode, result.status) {
            (None, GateStatus::Pass) => Some(0),
            (rc, _) => rc,
        };

        Self {
            gate: result.name.clone(),
            ok: result.status == GateStatus::Pass,
            status: result.status,
            info: result.info.clone(),
            details: result.details.clone(),
            returncode,
            stdout: result
                .stdout
                .clone()
                .unwrap_or_else(|| result.details.clone()),
            stderr: result.stderr.clone().unwrap_or_default(),
        }
    }
}

/// Renders the summary table with its verdict line
#[must_use]
pub fn format_summary<'a>(results: impl IntoIterator<Item = &'a GateResult>, verdict: Verdict) -> String {
    let mut out = String::from("Preflight Gate Summary\n----------------------\n");

    for result in results {
        if result.info.is_empty() {
            let _ = writeln!(out, "{} {}", result.name, result.status);
        } else {
            let _ = writeln!(out, "{} {} {}", result.name, result.status, result.info);
        }
    }

    let _ = writeln!(out, "\nVerdict: {}\n", verdict.decorated());
    if verdict.ok {
        out.push_str("Everything looks good. You'll almost certainly pass CI on the first try.");
    } else {
        out.push_str("One or more checks FAILED. Read details above and fix before continuing.");
    }
    out
}

/// Renders the details of FAIL and SKIPPED results
#[must_use]
pub fn verbose_details<'a>(results: impl IntoIterator<Item = &'a GateResult>) -> String {
    let mut out = String::new();
    for result in results {
        if result.status == GateStatus::Pass {
            continue;
        }
        let _ = writeln!(out, "=== {} {} ===", result.name, result.status);
        if !result.details.is_empty() {
            let _ = writeln!(out, "{}", result.details);
        }
        out.push('\n');
    }
    out
}
