//! Plan domain types and normalization
//!
//! A [`Plan`] is the canonical, ordered job/step structure that both the
//! gate runner and the plan executor consume. It is built once per
//! invocation by the [`Normalizer`] and never mutated afterwards.

pub mod errors;
pub mod interpreter;
pub mod normalizer;
pub mod source;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub use errors::{PlanError, RunError};
pub use interpreter::{InterpreterOverride, PYTHON_ENV};
pub use normalizer::{Normalizer, NormalizerRules};
pub use source::{JobSource, StepSource, WorkflowSource};

/// Environment variables for a step, ordered for deterministic output.
pub type Environment = BTreeMap<String, String>;

/// Where a step came from, kept for reporting and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOrigin {
    /// Workflow display name.
    pub workflow: String,
    /// Job id inside the workflow.
    pub job: String,
    /// Position of the step in the job as declared.
    pub index: usize,
    /// External action reference (`uses:`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// A single executable unit of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step display name.
    pub name: String,
    /// Shell command line; `None` for action-only steps.
    pub command: Option<String>,
    /// True when the command looks like a package-manager install.
    pub install: bool,
    /// Effective environment (workflow < job < step).
    pub environment: Environment,
    /// Source metadata.
    pub origin: StepOrigin,
}

impl Step {
    /// Returns the command if there is something to run
    #[must_use]
    pub fn runnable_command(&self) -> Option<&str> {
        self.command
            .as_deref()
            .map(str::trim)
            .filter(|cmd| !cmd.is_empty())
    }
}

/// An ordered list of steps from one pipeline job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job id.
    pub name: String,
    /// Name of the workflow the job was declared in.
    pub workflow: String,
    /// Steps in execution order.
    pub steps: Vec<Step>,
}

/// Normalized, ordered job/step structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Jobs in execution order.
    pub jobs: Vec<Job>,
}

impl Plan {
    /// Creates a plan from already-ordered jobs
    #[must_use]
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    /// Returns true if the plan has no jobs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of jobs
    #[must_use]
    pub fn total_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Number of steps across all jobs
    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.jobs.iter().map(|job| job.steps.len()).sum()
    }

    /// Renders a dry-run listing of what would be executed
    #[must_use]
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "No runnable CI steps found.\n".to_string();
        }

        let mut out = String::new();
        for job in &self.jobs {
            let _ = writeln!(out, "[{}] {}", job.workflow, job.name);
            for step in &job.steps {
                let tag = if step.install { " (install)" } else { "" };
                match step.runnable_command() {
                    Some(cmd) => {
                        let _ = writeln!(out, "  - {}{tag}: {cmd}", step.name);
                    }
                    None => {
                        let action = step.origin.action.as_deref().unwrap_or("-");
                        let _ = writeln!(out, "  - {}: uses {action}", step.name);
                    }
                }
            }
        }
        out
    }
}
