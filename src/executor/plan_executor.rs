//! Adaptive plan execution
//!
//! Runs a [`Plan`] job by job, step by step, and reports the first broken
//! step precisely instead of enumerating downstream breakage.
//!
//! Two modes are supported:
//!
//! - [`ExecutionMode::EarlyStop`] (default): the run halts at the first
//!   failing or safety-blocked step; later jobs and steps are not attempted.
//! - [`ExecutionMode::Bulk`]: every step runs regardless of earlier results.
//!
//! In both modes at most one failure is captured with forensics: the
//! earliest failing command in plan order. A safety block never carries
//! forensics, so in bulk mode a block may come first in
//! `summary.failed_at` while a later command holds the forensics.

use super::safety::SafetyFilter;
use super::traits::{CommandLine, CommandOutput, CommandRunner};
use crate::infrastructure::license::{Authorization, Authorizer};
use crate::infrastructure::quickfix::{HintProvider, NoHints, resolve_hint};
use crate::plan::{Job, Plan, RunError, Step};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How the executor reacts to a failing step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Halt the whole run at the first failure
    #[default]
    EarlyStop,
    /// Run every step and report all outcomes
    Bulk,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EarlyStop => write!(f, "early-stop"),
            Self::Bulk => write!(f, "bulk"),
        }
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Exited with code 0
    Passed,
    /// Exited non-zero or could not be spawned
    Failed,
    /// Nothing to run
    Skipped,
    /// Refused by the safety filter, never spawned
    Blocked,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
            Self::Blocked => "BLOCKED",
        })
    }
}

/// Full context of the first failing step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureForensics {
    /// Workflow the step belongs to.
    pub workflow_name: String,
    /// Job the step belongs to.
    pub job_name: String,
    /// Step name.
    pub step_name: String,
    /// Command that failed.
    pub command: String,
    /// Exit code.
    pub exit_code: i32,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// One-line remediation hint.
    pub hint: String,
}

/// Why a run did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailedAt {
    /// The credential was missing or invalid; nothing ran
    License {
        /// Reason given by the authorizer.
        message: String,
    },
    /// A step was refused by the safety filter
    Blocked {
        /// Workflow name.
        workflow_name: String,
        /// Job name.
        job_name: String,
        /// Step name.
        step_name: String,
        /// Refused command.
        command: String,
        /// Deny-list entry that matched.
        pattern: String,
    },
    /// A step ran and failed
    Command(FailureForensics),
}

/// Trace entry for one attempted step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Job name.
    pub job_name: String,
    /// Workflow name.
    pub workflow_name: String,
    /// Step name.
    pub step_name: String,
    /// Command (absent for action-only steps).
    pub command: Option<String>,
    /// Install/setup classification.
    pub install: bool,
    /// Outcome.
    pub status: StepStatus,
    /// Exit code, when the command ran.
    pub exit_code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Explanation for skipped/blocked/errored steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Forensics, only on the first failing step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forensics: Option<FailureForensics>,
}

/// Per-job trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTrace {
    /// Job name.
    pub job_name: String,
    /// Workflow name.
    pub workflow_name: String,
    /// Attempted steps in order.
    pub steps: Vec<ExecutionRecord>,
}

/// Summary counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Jobs in the plan.
    pub total_jobs: usize,
    /// Steps in the plan.
    pub total_steps: usize,
    /// Steps visited before the run ended.
    pub steps_attempted: usize,
    /// First block or failure, if any.
    pub failed_at: Option<FailedAt>,
    /// Total runtime in milliseconds.
    pub runtime_ms: u64,
}

/// Structured result of a plan execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// True when no step failed or was blocked.
    pub ok: bool,
    /// Mode the run used.
    pub mode: ExecutionMode,
    /// Summary counts and first failure.
    pub summary: ExecutionSummary,
    /// Nested per-job trace.
    pub jobs: Vec<JobTrace>,
}

impl ExecutionReport {
    /// Forensics of the first failing command, if any
    ///
    /// In bulk mode this can differ from `summary.failed_at`, which holds a
    /// safety block when one came first.
    #[must_use]
    pub fn forensics(&self) -> Option<&FailureForensics> {
        self.records().find_map(|r| r.forensics.as_ref())
    }

    /// All step records in execution order
    pub fn records(&self) -> impl Iterator<Item = &ExecutionRecord> {
        self.jobs.iter().flat_map(|job| job.steps.iter())
    }

    /// Finds the record of a step by name
    #[must_use]
    pub fn record(&self, step_name: &str) -> Option<&ExecutionRecord> {
        self.records().find(|r| r.step_name == step_name)
    }

    /// Renders a human-readable report
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let s = &self.summary;

        let _ = writeln!(out, "CI mirror run {} ({})", self.run_id, self.mode);
        let _ = writeln!(
            out,
            "Jobs: {}  Steps: {}  Attempted: {}  Runtime: {}ms",
            s.total_jobs, s.total_steps, s.steps_attempted, s.runtime_ms
        );

        for job in &self.jobs {
            let _ = writeln!(out, "\n[{}] {}", job.workflow_name, job.job_name);
            for record in &job.steps {
                let detail = match (record.status, record.exit_code, &record.reason) {
                    (StepStatus::Failed, Some(code), _) => {
                        format!("exit {code}, {}ms", record.duration_ms)
                    }
                    (_, _, Some(reason)) => reason.clone(),
                    _ => format!("{}ms", record.duration_ms),
                };
                let _ = writeln!(out, "  {:<7} {} ({detail})", record.status, record.step_name);
            }
        }

        match &s.failed_at {
            None => {}
            Some(FailedAt::License { message }) => {
                let _ = writeln!(out, "\nLicense check failed: {message}");
            }
            Some(FailedAt::Blocked {
                workflow_name,
                job_name,
                step_name,
                pattern,
                ..
            }) => {
                let _ = writeln!(
                    out,
                    "\nBlocked at: {workflow_name} / {job_name} / {step_name} (matched '{pattern}')"
                );
            }
            Some(FailedAt::Command(_)) => {}
        }
        if let Some(f) = self.forensics() {
            let _ = writeln!(
                out,
                "\nFailed at: {} / {} / {}",
                f.workflow_name, f.job_name, f.step_name
            );
            let _ = writeln!(out, "  Command:   {}", f.command);
            let _ = writeln!(out, "  Exit code: {}", f.exit_code);
            let _ = writeln!(out, "  Hint:      {}", f.hint);
        }

        let verdict = if self.ok { "OK" } else { "FAILED" };
        let _ = writeln!(out, "\nResult: {verdict}");
        out
    }
}

/// Executes plans on the host, one command at a time
#[derive(Clone)]
pub struct PlanExecutor {
    runner: Arc<dyn CommandRunner>,
    authorizer: Arc<dyn Authorizer>,
    hints: Arc<dyn HintProvider>,
    safety: SafetyFilter,
    mode: ExecutionMode,
}

impl fmt::Debug for PlanExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanExecutor")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl PlanExecutor {
    /// Creates an early-stop executor without remediation hints
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            runner,
            authorizer,
            hints: Arc::new(NoHints),
            safety: SafetyFilter,
            mode: ExecutionMode::default(),
        }
    }

    /// Sets the remediation hint provider
    #[must_use]
    pub fn with_hints(mut self, hints: Arc<dyn HintProvider>) -> Self {
        self.hints = hints;
        self
    }

    /// Sets the execution mode
    #[must_use]
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Executes the plan
    ///
    /// Never fails: authorization problems, safety blocks and command
    /// failures are all reported inside the returned [`ExecutionReport`].
    #[must_use]
    pub fn execute(&self, plan: &Plan, credential: Option<&str>) -> ExecutionReport {
        let run_id = Uuid::new_v4();
        let start = Instant::now();

        if let Authorization::Denied { reason } = self.authorizer.authorize(credential) {
            tracing::warn!(run_id = %run_id, reason = %reason, "Plan execution not authorized");
            return ExecutionReport {
                run_id,
                ok: false,
                mode: self.mode,
                summary: ExecutionSummary {
                    total_jobs: plan.total_jobs(),
                    total_steps: plan.total_steps(),
                    steps_attempted: 0,
                    failed_at: Some(FailedAt::License { message: reason }),
                    runtime_ms: 0,
                },
                jobs: Vec::new(),
            };
        }

        tracing::info!(
            run_id = %run_id,
            mode = %self.mode,
            jobs = plan.total_jobs(),
            steps = plan.total_steps(),
            "Starting plan execution"
        );

        let mut jobs = Vec::with_capacity(plan.jobs.len());
        let mut failed_at: Option<FailedAt> = None;
        let mut forensics_taken = false;
        let mut steps_attempted = 0;
        let mut ok = true;

        for job in &plan.jobs {
            tracing::info!(workflow = %job.workflow, job = %job.name, "Running job");

            let mut trace = JobTrace {
                job_name: job.name.clone(),
                workflow_name: job.workflow.clone(),
                steps: Vec::with_capacity(job.steps.len()),
            };
            let mut halt = false;

            for step in &job.steps {
                steps_attempted += 1;
                let mut record = self.run_step(job, step);

                match record.status {
                    StepStatus::Passed | StepStatus::Skipped => {}
                    StepStatus::Blocked => {
                        ok = false;
                        if failed_at.is_none() {
                            failed_at = Some(blocked_failure(job, step, &record));
                        }
                        halt = self.mode == ExecutionMode::EarlyStop;
                    }
                    StepStatus::Failed => {
                        ok = false;
                        if !forensics_taken {
                            forensics_taken = true;
                            let forensics = self.forensics(job, &record);
                            tracing::error!(
                                workflow = %forensics.workflow_name,
                                job = %forensics.job_name,
                                step = %forensics.step_name,
                                exit_code = forensics.exit_code,
                                "First failing step"
                            );
                            if failed_at.is_none() {
                                failed_at = Some(FailedAt::Command(forensics.clone()));
                            }
                            record.forensics = Some(forensics);
                        }
                        halt = self.mode == ExecutionMode::EarlyStop;
                    }
                }

                trace.steps.push(record);
                if halt {
                    break;
                }
            }

            jobs.push(trace);
            if halt {
                tracing::info!(run_id = %run_id, "Stopping run at first failure");
                break;
            }
        }

        let runtime_ms = millis(start.elapsed());
        tracing::info!(run_id = %run_id, ok, steps_attempted, runtime_ms, "Plan execution finished");

        ExecutionReport {
            run_id,
            ok,
            mode: self.mode,
            summary: ExecutionSummary {
                total_jobs: plan.total_jobs(),
                total_steps: plan.total_steps(),
                steps_attempted,
                failed_at,
                runtime_ms,
            },
            jobs,
        }
    }

    fn run_step(&self, job: &Job, step: &Step) -> ExecutionRecord {
        let mut record = ExecutionRecord {
            job_name: job.name.clone(),
            workflow_name: job.workflow.clone(),
            step_name: step.name.clone(),
            command: step.command.clone(),
            install: step.install,
            status: StepStatus::Skipped,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
            reason: None,
            forensics: None,
        };

        let Some(command) = step.runnable_command() else {
            record.reason = Some("no command to run".to_string());
            return record;
        };

        if let Err(rejection) = self.safety.check(command) {
            tracing::warn!(job = %job.name, step = %step.name, pattern = rejection.pattern, "Step blocked");
            record.status = StepStatus::Blocked;
            record.stderr = rejection.to_string();
            record.reason = Some(format!("blocked for safety, matched '{}'", rejection.pattern));
            return record;
        }

        let start = Instant::now();
        match self
            .runner
            .run(&CommandLine::shell(command), &step.environment)
        {
            Ok(CommandOutput {
                exit_code,
                stdout,
                stderr,
                duration,
            }) => {
                record.status = if exit_code == 0 {
                    StepStatus::Passed
                } else {
                    StepStatus::Failed
                };
                record.exit_code = Some(exit_code);
                record.stdout = stdout;
                record.stderr = stderr;
                record.duration_ms = millis(duration);
            }
            Err(e) => {
                record.status = StepStatus::Failed;
                record.exit_code = Some(if e.is_tool_missing() { 127 } else { -1 });
                record.stderr = e.to_string();
                record.reason = Some(invocation_reason(&e));
                record.duration_ms = millis(start.elapsed());
            }
        }

        record
    }

    fn forensics(&self, job: &Job, record: &ExecutionRecord) -> FailureForensics {
        let command = record.command.clone().unwrap_or_default();
        let hint = resolve_hint(self.hints.as_ref(), &command, &record.stdout, &record.stderr);

        FailureForensics {
            workflow_name: job.workflow.clone(),
            job_name: job.name.clone(),
            step_name: record.step_name.clone(),
            command,
            exit_code: record.exit_code.unwrap_or(-1),
            stdout: record.stdout.clone(),
            stderr: record.stderr.clone(),
            duration_ms: record.duration_ms,
            hint,
        }
    }
}

fn blocked_failure(job: &Job, step: &Step, record: &ExecutionRecord) -> FailedAt {
    let command = step.command.clone().unwrap_or_default();
    let pattern = SafetyFilter
        .check(&command)
        .err()
        .map(|r| r.pattern.to_string())
        .unwrap_or_default();

    FailedAt::Blocked {
        workflow_name: job.workflow.clone(),
        job_name: job.name.clone(),
        step_name: record.step_name.clone(),
        command,
        pattern,
    }
}

fn invocation_reason(err: &RunError) -> String {
    match err {
        RunError::ToolMissing { .. } => "shell not available".to_string(),
        other => format!("could not run: {other}"),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::license::{AlwaysGranted, KeyAuthorizer};
    use crate::plan::{Environment, StepOrigin};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Fake runner: `true` passes, `false` fails, anything else echoes.
    #[derive(Default)]
    struct ScriptedRunner {
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, command: &CommandLine, _env: &Environment) -> Result<CommandOutput, RunError> {
            let line = command.to_string();
            self.calls.lock().push(line.clone());
            let exit_code = match line.as_str() {
                "false" => 1,
                "missing-shell" => {
                    return Err(RunError::ToolMissing {
                        program: "sh".to_string(),
                    });
                }
                _ => 0,
            };
            Ok(CommandOutput {
                exit_code,
                stdout: format!("ran {line}"),
                stderr: if exit_code == 0 { String::new() } else { "boom".to_string() },
                duration: Duration::from_millis(1),
            })
        }
    }

    fn step(name: &str, command: Option<&str>) -> Step {
        Step {
            name: name.to_string(),
            command: command.map(str::to_string),
            install: false,
            environment: Environment::new(),
            origin: StepOrigin {
                workflow: "CI".to_string(),
                job: "qa".to_string(),
                index: 0,
                action: None,
            },
        }
    }

    fn job(name: &str, steps: Vec<Step>) -> Job {
        Job {
            name: name.to_string(),
            workflow: "CI".to_string(),
            steps,
        }
    }

    fn executor(runner: &Arc<ScriptedRunner>) -> PlanExecutor {
        PlanExecutor::new(runner.clone(), Arc::new(AlwaysGranted))
    }

    #[test]
    fn test_empty_plan_is_ok() {
        let runner = Arc::new(ScriptedRunner::default());
        let report = executor(&runner).execute(&Plan::default(), None);

        assert!(report.ok);
        assert_eq!(report.summary.steps_attempted, 0);
        assert_eq!(report.summary.failed_at, None);
        assert!(report.jobs.is_empty());
    }

    #[test]
    fn test_stops_at_first_failure() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![job(
            "qa",
            vec![
                step("lint", Some("true")),
                step("boom", Some("false")),
                step("never", Some("true")),
            ],
        )]);

        let report = executor(&runner).execute(&plan, None);

        assert!(!report.ok);
        let forensics = report.forensics().unwrap();
        assert_eq!(forensics.step_name, "boom");
        assert_eq!(forensics.job_name, "qa");
        assert_eq!(forensics.workflow_name, "CI");
        assert_eq!(forensics.exit_code, 1);
        assert_eq!(forensics.stderr, "boom");
        assert!(report.record("never").is_none());
        assert_eq!(report.summary.steps_attempted, 2);
        assert_eq!(report.summary.total_steps, 3);
        assert_eq!(runner.calls(), vec!["true", "false"]);
    }

    #[test]
    fn test_later_jobs_not_attempted() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![
            job("first", vec![step("bad", Some("false"))]),
            job("second", vec![step("good", Some("true"))]),
        ]);

        let report = executor(&runner).execute(&plan, None);

        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.summary.total_jobs, 2);
        assert_eq!(runner.calls(), vec!["false"]);
    }

    #[test]
    fn test_step_without_command_is_skipped() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![job(
            "qa",
            vec![step("deploy", None), step("test", Some("true"))],
        )]);

        let report = executor(&runner).execute(&plan, None);

        assert!(report.ok);
        let skipped = report.record("deploy").unwrap();
        assert_eq!(skipped.status, StepStatus::Skipped);
        assert_eq!(skipped.exit_code, None);
        assert_eq!(report.summary.steps_attempted, 2);
        assert_eq!(runner.calls(), vec!["true"]);
    }

    #[test]
    fn test_fork_bomb_is_blocked_and_never_spawned() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![job(
            "qa",
            vec![step("bomb", Some(":(){ :|:& };:")), step("after", Some("true"))],
        )]);

        let report = executor(&runner).execute(&plan, None);

        assert!(!report.ok);
        assert_eq!(report.record("bomb").unwrap().status, StepStatus::Blocked);
        assert!(report.record("after").is_none());
        assert!(runner.calls().is_empty());
        assert!(matches!(
            report.summary.failed_at,
            Some(FailedAt::Blocked { ref step_name, .. }) if step_name == "bomb"
        ));
    }

    #[test]
    fn test_bulk_mode_runs_everything() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![
            job(
                "qa",
                vec![
                    step("blocked", Some("sudo reboot")),
                    step("bad", Some("false")),
                    step("good", Some("true")),
                ],
            ),
            job("other", vec![step("bad-again", Some("false"))]),
        ]);

        let report = executor(&runner)
            .with_mode(ExecutionMode::Bulk)
            .execute(&plan, None);

        assert!(!report.ok);
        assert_eq!(report.mode, ExecutionMode::Bulk);
        assert_eq!(report.summary.steps_attempted, 4);
        assert_eq!(runner.calls(), vec!["false", "true", "false"]);
        assert!(matches!(report.summary.failed_at, Some(FailedAt::Blocked { .. })));

        let with_forensics: Vec<_> = report
            .records()
            .filter(|r| r.forensics.is_some())
            .map(|r| r.step_name.as_str())
            .collect();
        assert_eq!(with_forensics, vec!["bad"]);
    }

    #[test]
    fn test_bulk_block_before_failure_keeps_forensics() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![job(
            "qa",
            vec![step("blocked", Some("sudo reboot")), step("bad", Some("false"))],
        )]);

        let report = executor(&runner)
            .with_mode(ExecutionMode::Bulk)
            .execute(&plan, None);

        assert!(matches!(
            report.summary.failed_at,
            Some(FailedAt::Blocked { ref step_name, .. }) if step_name == "blocked"
        ));
        let forensics = report.forensics().unwrap();
        assert_eq!(forensics.step_name, "bad");
        assert_eq!(forensics.exit_code, 1);
        assert_eq!(report.record("bad").unwrap().forensics.as_ref(), Some(forensics));

        let text = report.render_text();
        assert!(text.contains("Blocked at: CI / qa / blocked"));
        assert!(text.contains("Failed at: CI / qa / bad"));
    }

    #[test]
    fn test_missing_license_runs_nothing() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![job("qa", vec![step("t", Some("true"))])]);
        let executor = PlanExecutor::new(runner.clone(), Arc::new(KeyAuthorizer::new()));

        let report = executor.execute(&plan, None);

        assert!(!report.ok);
        assert_eq!(report.summary.steps_attempted, 0);
        assert_eq!(
            report.summary.failed_at,
            Some(FailedAt::License {
                message: "No license key provided".to_string()
            })
        );
        assert!(runner.calls().is_empty());

        let granted = executor.execute(&plan, Some("TEST-KEY-OK"));
        assert!(granted.ok);
    }

    #[test]
    fn test_hint_provider_feeds_forensics() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![job("qa", vec![step("boom", Some("false"))])]);
        let hints = |cmd: &str, _: &str, stderr: &str| Some(format!("fix {cmd}: {stderr}"));

        let report = executor(&runner)
            .with_hints(Arc::new(hints))
            .execute(&plan, None);

        assert_eq!(report.forensics().unwrap().hint, "fix false: boom");
    }

    #[test]
    fn test_invocation_error_is_a_failure() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![job("qa", vec![step("x", Some("missing-shell"))])]);

        let report = executor(&runner).execute(&plan, None);

        assert!(!report.ok);
        let forensics = report.forensics().unwrap();
        assert_eq!(forensics.exit_code, 127);
        assert!(forensics.stderr.contains("not found"));
    }

    #[test]
    fn test_real_shell_scenario() {
        let plan = Plan::new(vec![job(
            "qa",
            vec![
                step("lint", Some("true")),
                step("boom", Some("false")),
                step("never", Some("true")),
            ],
        )]);
        let executor = PlanExecutor::new(
            Arc::new(crate::executor::HostRunner::new()),
            Arc::new(AlwaysGranted),
        );

        let report = executor.execute(&plan, None);

        assert!(!report.ok);
        assert_eq!(report.forensics().unwrap().step_name, "boom");
        assert!(report.record("never").is_none());
    }

    #[test]
    fn test_report_serializes_failed_at_reason() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![job("qa", vec![step("boom", Some("false"))])]);

        let report = executor(&runner).execute(&plan, None);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["summary"]["failed_at"]["reason"], "command");
        assert_eq!(json["summary"]["failed_at"]["step_name"], "boom");
        assert_eq!(json["mode"], "early_stop");
    }

    #[test]
    fn test_render_text() {
        let runner = Arc::new(ScriptedRunner::default());
        let plan = Plan::new(vec![job(
            "qa",
            vec![step("lint", Some("true")), step("boom", Some("false"))],
        )]);

        let text = executor(&runner).execute(&plan, None).render_text();

        assert!(text.contains("[CI] qa"));
        assert!(text.contains("Failed at: CI / qa / boom"));
        assert!(text.contains("Result: FAILED"));
    }

    /// Plans of 1-4 jobs with 1-5 steps each; `false` marks a failing step.
    fn arb_outcomes() -> impl Strategy<Value = Vec<Vec<bool>>> {
        proptest::collection::vec(proptest::collection::vec(any::<bool>(), 1..6), 1..5)
    }

    fn plan_from(outcomes: &[Vec<bool>]) -> Plan {
        Plan::new(
            outcomes
                .iter()
                .enumerate()
                .map(|(j, steps)| {
                    let steps = steps
                        .iter()
                        .enumerate()
                        .map(|(s, passes)| {
                            let command = if *passes { "true" } else { "false" };
                            step(&format!("j{j}s{s}"), Some(command))
                        })
                        .collect();
                    job(&format!("job-{j}"), steps)
                })
                .collect(),
        )
    }

    proptest! {
        #[test]
        fn early_stop_reports_earliest_failure(outcomes in arb_outcomes()) {
            let runner = Arc::new(ScriptedRunner::default());
            let plan = plan_from(&outcomes);
            let flat: Vec<(String, bool)> = outcomes
                .iter()
                .enumerate()
                .flat_map(|(j, steps)| {
                    steps.iter().enumerate().map(move |(s, p)| (format!("j{j}s{s}"), *p))
                })
                .collect();

            let report = executor(&runner).execute(&plan, None);
            let attempted: Vec<&str> = report.records().map(|r| r.step_name.as_str()).collect();

            match flat.iter().position(|(_, passes)| !passes) {
                Some(k) => {
                    prop_assert!(!report.ok);
                    prop_assert_eq!(&report.forensics().unwrap().step_name, &flat[k].0);
                    prop_assert_eq!(report.summary.steps_attempted, k + 1);
                    prop_assert_eq!(attempted.len(), k + 1);
                    prop_assert_eq!(attempted.last().copied(), Some(flat[k].0.as_str()));
                    prop_assert_eq!(runner.calls().len(), k + 1);
                }
                None => {
                    prop_assert!(report.ok);
                    prop_assert!(report.forensics().is_none());
                    prop_assert_eq!(report.summary.steps_attempted, flat.len());
                }
            }
        }

        #[test]
        fn bulk_attempts_every_step(outcomes in arb_outcomes()) {
            let runner = Arc::new(ScriptedRunner::default());
            let plan = plan_from(&outcomes);

            let report = executor(&runner).with_mode(ExecutionMode::Bulk).execute(&plan, None);

            prop_assert_eq!(report.summary.steps_attempted, plan.total_steps());
            prop_assert!(report.records().filter(|r| r.forensics.is_some()).count() <= 1);
            let first_failed = report
                .records()
                .find(|r| r.status == StepStatus::Failed)
                .map(|r| r.step_name.clone());
            prop_assert_eq!(report.forensics().map(|f| f.step_name.clone()), first_failed);
        }
    }
}
