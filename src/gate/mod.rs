//! Gate runner
//!
//! A gate is a fixed, ordered sequence of named checks. Every check runs,
//! regardless of earlier results, and is graded PASS, FAIL or SKIPPED.
//! SKIPPED is reserved for missing optional tooling or configuration and
//! never blocks; the gate is blocked iff at least one check FAILs.
//!
//! Check implementations are looked up in a [`CheckRegistry`] at run time,
//! so callers (and tests) substitute behavior by registering their own
//! [`Check`] for a [`CheckId`].

mod changed;
mod checks;
mod report;
mod runner;

pub use changed::{changed_files, python_files, test_selector};
pub use checks::{Check, CheckContext, default_check};
pub use report::{GateResultJson, format_summary, verbose_details};
pub use runner::{AllGatesOutcome, CheckRegistry, GateOutcome, GateRunner, Verdict};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which gate to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateKind {
    /// Fast checks before a commit
    PreCommit,
    /// Fast checks plus heavier probes before a push
    PrePush,
}

impl GateKind {
    /// Every gate, in the order `run_all_gates` uses
    pub const ALL: [GateKind; 2] = [GateKind::PreCommit, GateKind::PrePush];

    /// Ordered task list for this gate
    #[must_use]
    pub fn tasks(self) -> &'static [GateTask] {
        match self {
            Self::PreCommit => PRE_COMMIT_TASKS,
            Self::PrePush => PRE_PUSH_TASKS,
        }
    }

    /// Stable name, as used on the command line and in hook scripts
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreCommit => "pre-commit",
            Self::PrePush => "pre-push",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown gate name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("gate must be 'pre-commit' or 'pre-push', got '{0}'")]
pub struct UnknownGate(pub String);

impl FromStr for GateKind {
    type Err = UnknownGate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-commit" => Ok(Self::PreCommit),
            "pre-push" => Ok(Self::PrePush),
            other => Err(UnknownGate(other.to_string())),
        }
    }
}

/// Identifies a check implementation slot in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    /// Linter
    Lint,
    /// Static type checker
    Types,
    /// Test suite
    Tests,
    /// SQLite migration drift probe
    SqliteDrift,
    /// Postgres migration drift probe
    PgDrift,
    /// Container smoke test
    DockerSmoke,
    /// Local dry-run of the CI workflows
    CiMirror,
}

impl CheckId {
    /// Short display name used in check output
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Lint => "Lint",
            Self::Types => "Types",
            Self::Tests => "Tests",
            Self::SqliteDrift => "SQLite Drift",
            Self::PgDrift => "PG Drift",
            Self::DockerSmoke => "Docker Smoke",
            Self::CiMirror => "CI Mirror",
        }
    }
}

/// A labelled slot in a gate's sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTask {
    /// Dot-padded display label, e.g. `Lint..........`
    pub label: &'static str,
    /// Check run for this task
    pub check: CheckId,
}

const fn task(label: &'static str, check: CheckId) -> GateTask {
    GateTask { label, check }
}

/// Pre-commit sequence
pub const PRE_COMMIT_TASKS: &[GateTask] = &[
    task("Lint..........", CheckId::Lint),
    task("Types.........", CheckId::Types),
    task("Tests.........", CheckId::Tests),
    task("SQLite Drift..", CheckId::SqliteDrift),
    task("CI Mirror.....", CheckId::CiMirror),
];

/// Pre-push sequence: pre-commit plus the heavy probes
pub const PRE_PUSH_TASKS: &[GateTask] = &[
    task("Lint..........", CheckId::Lint),
    task("Types.........", CheckId::Types),
    task("Tests.........", CheckId::Tests),
    task("SQLite Drift..", CheckId::SqliteDrift),
    task("PG Drift......", CheckId::PgDrift),
    task("Docker Smoke..", CheckId::DockerSmoke),
    task("CI Mirror.....", CheckId::CiMirror),
];

/// Grade of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateStatus {
    /// The check succeeded
    Pass,
    /// The check signaled an abnormal outcome
    Fail,
    /// Optional tooling or configuration is missing
    Skipped,
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// Display name; replaced by the task label when run through a gate
    pub name: String,
    /// Grade
    pub status: GateStatus,
    /// Short summary for the summary table
    pub info: String,
    /// Long explanation for verbose output
    pub details: String,
    /// Exit code, when a process ran
    pub returncode: Option<i32>,
    /// Captured stdout, when a process ran
    pub stdout: Option<String>,
    /// Captured stderr, when a process ran
    pub stderr: Option<String>,
}

impl GateResult {
    fn new(name: impl Into<String>, status: GateStatus, info: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            info: info.into(),
            details: String::new(),
            returncode: None,
            stdout: None,
            stderr: None,
        }
    }

    /// Creates a PASS result
    #[must_use]
    pub fn pass(name: impl Into<String>, info: impl Into<String>) -> Self {
        Self::new(name, GateStatus::Pass, info)
    }

    /// Creates a FAIL result
    #[must_use]
    pub fn fail(name: impl Into<String>, info: impl Into<String>) -> Self {
        Self::new(name, GateStatus::Fail, info)
    }

    /// Creates a SKIPPED result
    #[must_use]
    pub fn skipped(name: impl Into<String>, info: impl Into<String>) -> Self {
        Self::new(name, GateStatus::Skipped, info)
    }

    /// Sets the long details
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Attaches process output
    #[must_use]
    pub fn with_output(mut self, returncode: i32, stdout: String, stderr: String) -> Self {
        self.returncode = Some(returncode);
        self.stdout = Some(stdout);
        self.stderr = Some(stderr);
        self
    }

    /// Returns true if the result blocks the gate
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status == GateStatus::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gate_kind_parse_and_display() {
        assert_eq!("pre-commit".parse::<GateKind>(), Ok(GateKind::PreCommit));
        assert_eq!("pre-push".parse::<GateKind>(), Ok(GateKind::PrePush));
        assert_eq!(GateKind::PrePush.to_string(), "pre-push");
        assert!("pre-merge".parse::<GateKind>().is_err());
    }

    #[test]
    fn test_pre_push_extends_pre_commit() {
        let commit: Vec<_> = PRE_COMMIT_TASKS.iter().map(|t| t.check).collect();
        let push: Vec<_> = PRE_PUSH_TASKS.iter().map(|t| t.check).collect();

        assert_eq!(
            push,
            vec![
                CheckId::Lint,
                CheckId::Types,
                CheckId::Tests,
                CheckId::SqliteDrift,
                CheckId::PgDrift,
                CheckId::DockerSmoke,
                CheckId::CiMirror,
            ]
        );
        assert!(commit.iter().all(|c| push.contains(c)));
        assert_eq!(commit.last(), Some(&CheckId::CiMirror));
    }

    #[test]
    fn test_labels_are_aligned() {
        for task in PRE_PUSH_TASKS {
            assert_eq!(task.label.len(), 14, "{}", task.label);
            assert!(task.label.starts_with(task.check.name()));
        }
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&GateStatus::Skipped).unwrap();
        assert_eq!(json, "\"SKIPPED\"");
    }
}
