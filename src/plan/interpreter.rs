//! Interpreter override for locally mirrored commands
//!
//! CI runners pin their own Python; locally the developer may want a
//! specific virtualenv instead. When an override is set, bare `python` /
//! `python3` tokens are replaced by it and bare `pytest` becomes
//! `<python> -m pytest`.

use super::Plan;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Environment variable holding the preferred interpreter
pub const PYTHON_ENV: &str = "PREFLIGHT_PYTHON";

static PYTHON_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpython3?\b").expect("valid regex"));

static PYTEST_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-m\s+)?\bpytest\b").expect("valid regex"));

/// Rewrites step commands to run under a chosen interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterOverride {
    python: String,
}

impl InterpreterOverride {
    /// Creates an override; blank paths yield `None`
    #[must_use]
    pub fn new(python: &str) -> Option<Self> {
        let python = python.trim();
        (!python.is_empty()).then(|| Self {
            python: python.to_string(),
        })
    }

    /// Interpreter the commands are rewritten to
    #[must_use]
    pub fn python(&self) -> &str {
        &self.python
    }

    /// Rewrites a single command line
    #[must_use]
    pub fn rewrite(&self, command: &str) -> String {
        let out = PYTHON_TOKEN.replace_all(command, regex::NoExpand(&self.python));
        PYTEST_TOKEN
            .replace_all(&out, |caps: &Captures<'_>| {
                if caps.get(1).is_some() {
                    caps[0].to_string()
                } else {
                    format!("{} -m pytest", self.python)
                }
            })
            .into_owned()
    }

    /// Rewrites every step command of a plan
    #[must_use]
    pub fn apply(&self, mut plan: Plan) -> Plan {
        for step in plan.jobs.iter_mut().flat_map(|job| job.steps.iter_mut()) {
            if let Some(command) = step.command.as_mut() {
                let rewritten = self.rewrite(command);
                if rewritten != *command {
                    tracing::debug!(step = %step.name, command = %rewritten, "Rewrote step for local interpreter");
                    *command = rewritten;
                }
            }
        }
        plan
    }
}
