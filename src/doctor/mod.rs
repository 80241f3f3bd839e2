//! Project health report
//!
//! Runs a list of tool invocations, grades each one, and scores the project
//! by the share of checks that passed. Missing tools do not count against
//! the score: doctor reports what is installed, it does not install it.

mod report;

pub use report::render_markdown;

use crate::executor::{CommandLine, CommandRunner};
use crate::infrastructure::config::ToolCommands;
use crate::plan::{Environment, RunError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Upper bound on worker threads in parallel mode
pub const MAX_WORKERS: usize = 8;

/// Environment variable listing checks to skip (`all`, `*` or a comma list)
pub const SKIP_ENV: &str = "PREFLIGHT_DOCTOR_SKIP";

/// A check to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorSpec {
    /// Check name, matched case-insensitively against the skip list
    pub name: String,
    /// Shell-words command string
    pub command: String,
    /// Fix suggested when the check fails
    pub fix_hint: Option<String>,
}

impl DoctorSpec {
    /// Creates a spec
    #[must_use]
    pub fn new(name: impl Into<String>, command: impl Into<String>, fix_hint: Option<&str>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            fix_hint: fix_hint.map(str::to_string),
        }
    }
}

/// The standard checks, using the configured tool commands where they exist
#[must_use]
pub fn default_specs(tools: &ToolCommands) -> Vec<DoctorSpec> {
    vec![
        DoctorSpec::new(
            "pytest",
            tools.tests.as_str(),
            Some("Run failing tests locally and fix assertions/import errors."),
        ),
        DoctorSpec::new("ruff", tools.lint.as_str(), Some("auto-fix: ruff check . --fix")),
        DoctorSpec::new("black", "black --check .", Some("format: black .")),
        DoctorSpec::new(
            "mypy",
            tools.types.as_str(),
            Some("add/adjust type hints where mypy reports errors."),
        ),
        DoctorSpec::new(
            "coverage-report",
            "coverage report --show-missing",
            Some("run: coverage run -m pytest -q && coverage report --show-missing"),
        ),
    ]
}

/// Which checks to skip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SkipPolicy {
    /// Run everything
    #[default]
    None,
    /// Skip every check
    All,
    /// Skip the listed (lowercased) names
    Names(BTreeSet<String>),
}

impl SkipPolicy {
    /// Parses `all`, `*` or a comma-separated list of names
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim().to_lowercase();
        if value == "all" || value == "*" {
            return Self::All;
        }
        let names: BTreeSet<String> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            Self::None
        } else {
            Self::Names(names)
        }
    }

    /// Adds names, keeping `All` as is
    #[must_use]
    pub fn with_names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra: BTreeSet<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        match self {
            Self::All => Self::All,
            _ if extra.is_empty() => self,
            Self::None => Self::Names(extra),
            Self::Names(mut names) => {
                names.extend(extra);
                Self::Names(names)
            }
        }
    }

    /// Returns true if the named check should be skipped
    #[must_use]
    pub fn skips(&self, name: &str) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Names(names) => names.contains(&name.to_lowercase()),
        }
    }
}

/// How to run the checks
#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    /// Run checks on a bounded worker pool
    pub parallel: bool,
    /// Checks to skip
    pub skip: SkipPolicy,
}

/// Result of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorCheck {
    /// Check name
    pub name: String,
    /// Whether it passed (missing tools count as passed)
    pub passed: bool,
    /// Trimmed combined output, or a skip note
    pub output: String,
    /// Fix suggestion, only on checks that ran
    pub fix_hint: Option<String>,
}

impl DoctorCheck {
    fn skipped(name: &str, why: String) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            output: format!("skipped ({why})"),
            fix_hint: None,
        }
    }
}

/// Aggregated health report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorReport {
    /// Check results, in declared order
    pub checks: Vec<DoctorCheck>,
    /// Number of passed checks
    pub passed_count: usize,
    /// Number of checks
    pub total_count: usize,
    /// Share of passed checks, 0 to 100
    pub score_pct: f64,
    /// Fix hints of the failing checks, deduplicated
    pub quickfixes: Vec<String>,
    /// One-line summary
    pub summary: String,
}

impl DoctorReport {
    fn from_checks(checks: Vec<DoctorCheck>) -> Self {
        let total_count = checks.len();
        let passed_count = checks.iter().filter(|c| c.passed).count();
        #[allow(clippy::cast_precision_loss)]
        let score_pct = if total_count == 0 {
            100.0
        } else {
            passed_count as f64 / total_count as f64 * 100.0
        };

        let mut quickfixes: Vec<String> = Vec::new();
        for hint in checks
            .iter()
            .filter(|c| !c.passed)
            .filter_map(|c| c.fix_hint.as_ref())
        {
            if !quickfixes.contains(hint) {
                quickfixes.push(hint.clone());
            }
        }

        Self {
            summary: format!("{passed_count}/{total_count} checks passed ({score_pct:.0}%)."),
            checks,
            passed_count,
            total_count,
            score_pct,
            quickfixes,
        }
    }

    /// True when every check passed
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.passed_count == self.total_count
    }
}

/// Runs the checks and builds the report
///
/// In parallel mode at most [`MAX_WORKERS`] threads pull checks from a
/// shared cursor; results are reassembled in declared order either way.
#[must_use]
pub fn gather(runner: &dyn CommandRunner, specs: &[DoctorSpec], options: &DoctorOptions) -> DoctorReport {
    let slots: Vec<Mutex<Option<DoctorCheck>>> = specs.iter().map(|_| Mutex::new(None)).collect();
    let pending: Vec<usize> = specs
        .iter()
        .enumerate()
        .filter_map(|(i, spec)| {
            if options.skip.skips(&spec.name) {
                tracing::debug!(check = %spec.name, "Skipping doctor check");
                *slots[i].lock() = Some(DoctorCheck::skipped(&spec.name, "env".to_string()));
                None
            } else {
                Some(i)
            }
        })
        .collect();

    if options.parallel && pending.len() > 1 {
        let workers = pending.len().min(MAX_WORKERS);
        let cursor = AtomicUsize::new(0);
        tracing::debug!(workers, checks = pending.len(), "Running doctor checks in parallel");

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let next = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(&index) = pending.get(next) else {
                            break;
                        };
                        let check = run_guarded(runner, &specs[index]);
                        *slots[index].lock() = Some(check);
                    }
                });
            }
        });
    } else {
        for &index in &pending {
            *slots[index].lock() = Some(run_guarded(runner, &specs[index]));
        }
    }

    let checks = slots
        .into_iter()
        .zip(specs)
        .map(|(slot, spec)| {
            slot.into_inner().unwrap_or_else(|| DoctorCheck {
                name: spec.name.clone(),
                passed: false,
                output: "check did not run".to_string(),
                fix_hint: spec.fix_hint.clone(),
            })
        })
        .collect();

    let report = DoctorReport::from_checks(checks);
    tracing::info!(
        passed = report.passed_count,
        total = report.total_count,
        "Doctor finished"
    );
    report
}

fn run_guarded(runner: &dyn CommandRunner, spec: &DoctorSpec) -> DoctorCheck {
    catch_unwind(AssertUnwindSafe(|| run_check(runner, spec))).unwrap_or_else(|_| {
        tracing::warn!(check = %spec.name, "Doctor check panicked");
        DoctorCheck {
            name: spec.name.clone(),
            passed: false,
            output: "check panicked".to_string(),
            fix_hint: spec.fix_hint.clone(),
        }
    })
}

fn run_check(runner: &dyn CommandRunner, spec: &DoctorSpec) -> DoctorCheck {
    let argv = match shell_words::split(&spec.command) {
        Ok(argv) if !argv.is_empty() => argv,
        Ok(_) => return DoctorCheck::skipped(&spec.name, "no command configured".to_string()),
        Err(e) => {
            return DoctorCheck {
                name: spec.name.clone(),
                passed: false,
                output: format!("invalid command '{}': {e}", spec.command),
                fix_hint: spec.fix_hint.clone(),
            };
        }
    };

    match runner.run(&CommandLine::Argv(argv), &Environment::new()) {
        Ok(output) => DoctorCheck {
            name: spec.name.clone(),
            passed: output.is_success(),
            output: output.combined().trim().to_string(),
            fix_hint: spec.fix_hint.clone(),
        },
        Err(RunError::ToolMissing { program }) => {
            DoctorCheck::skipped(&spec.name, format!("tool not installed: {program}"))
        }
        Err(e) => DoctorCheck {
            name: spec.name.clone(),
            passed: false,
            output: e.to_string(),
            fix_hint: spec.fix_hint.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandOutput;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    /// Programs listed pass or fail by exit code; others are missing.
    struct Tools(Vec<(&'static str, i32)>);

    impl CommandRunner for Tools {
        fn run(&self, command: &CommandLine, _env: &Environment) -> Result<CommandOutput, RunError> {
            let program = command.program().unwrap_or_default();
            std::thread::sleep(Duration::from_millis(5));
            match self.0.iter().find(|(p, _)| *p == program) {
                Some((_, code)) => Ok(CommandOutput {
                    exit_code: *code,
                    stdout: format!("{program} output\nsecond line\n"),
                    stderr: String::new(),
                    duration: Duration::from_millis(5),
                }),
                None => Err(RunError::ToolMissing {
                    program: program.to_string(),
                }),
            }
        }
    }

    fn specs() -> Vec<DoctorSpec> {
        default_specs(&ToolCommands::default())
    }

    #[test]
    fn test_scores_and_quickfixes() {
        let runner = Tools(vec![("pytest", 0), ("ruff", 1), ("black", 1), ("mypy", 0)]);
        let report = gather(&runner, &specs(), &DoctorOptions::default());

        assert_eq!(report.total_count, 5);
        assert_eq!(report.passed_count, 3);
        assert!((report.score_pct - 60.0).abs() < f64::EPSILON);
        assert_eq!(report.summary, "3/5 checks passed (60%).");
        assert_eq!(
            report.quickfixes,
            vec!["auto-fix: ruff check . --fix".to_string(), "format: black .".to_string()]
        );
        assert_eq!(
            report.checks[4].output,
            "skipped (tool not installed: coverage)"
        );
        assert!(report.checks[4].passed);
    }

    #[test]
    fn test_parallel_preserves_order() {
        let runner = Tools(vec![("pytest", 0), ("ruff", 0), ("black", 1), ("mypy", 0), ("coverage", 0)]);
        let sequential = gather(&runner, &specs(), &DoctorOptions::default());
        let parallel = gather(
            &runner,
            &specs(),
            &DoctorOptions {
                parallel: true,
                skip: SkipPolicy::None,
            },
        );

        assert_eq!(parallel, sequential);
        let names: Vec<_> = parallel.checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["pytest", "ruff", "black", "mypy", "coverage-report"]);
    }

    #[test]
    fn test_parallel_with_many_specs() {
        let specs: Vec<DoctorSpec> = (0..20)
            .map(|i| DoctorSpec::new(format!("check-{i}"), "pytest", None))
            .collect();
        let report = gather(
            &Tools(vec![("pytest", 0)]),
            &specs,
            &DoctorOptions {
                parallel: true,
                skip: SkipPolicy::None,
            },
        );

        assert_eq!(report.passed_count, 20);
        assert_eq!(report.checks[19].name, "check-19");
    }

    #[test]
    fn test_skip_policy() {
        assert_eq!(SkipPolicy::parse(""), SkipPolicy::None);
        assert_eq!(SkipPolicy::parse("ALL"), SkipPolicy::All);
        assert_eq!(SkipPolicy::parse("*"), SkipPolicy::All);
        assert!(SkipPolicy::parse("pytest, Ruff").skips("ruff"));
        assert!(SkipPolicy::None.with_names(["MyPy"]).skips("mypy"));
        assert_eq!(SkipPolicy::All.with_names(["x"]), SkipPolicy::All);
    }

    #[test]
    fn test_skipped_checks_pass() {
        let runner = Tools(vec![("pytest", 1)]);
        let report = gather(
            &runner,
            &specs(),
            &DoctorOptions {
                parallel: false,
                skip: SkipPolicy::parse("pytest"),
            },
        );

        assert_eq!(report.checks[0].output, "skipped (env)");
        assert!(report.checks[0].passed);
        assert!(report.is_healthy());
    }

    #[test]
    fn test_empty_specs_score_full() {
        let report = gather(&Tools(Vec::new()), &[], &DoctorOptions::default());
        assert_eq!(report.total_count, 0);
        assert!((report.score_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_shape() {
        let report = gather(&Tools(vec![("pytest", 0)]), &specs()[..1], &DoctorOptions::default());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["checks"][0]["name"], "pytest");
        assert_eq!(json["checks"][0]["passed"], true);
        assert_eq!(json["summary"], "1/1 checks passed (100%).");
    }
}
