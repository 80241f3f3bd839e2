//! Gate execution and verdicts

use super::checks::{Check, CheckContext, default_check};
use super::{CheckId, GateKind, GateResult, GateStatus};
use serde::Serialize;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Check implementations keyed by slot
///
/// A slot with no implementation grades SKIPPED.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: HashMap<CheckId, Arc<dyn Check>>,
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.checks.keys().collect();
        ids.sort_by_key(|id| id.name());
        f.debug_struct("CheckRegistry").field("checks", &ids).finish()
    }
}

impl CheckRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in check
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for id in [
            CheckId::Lint,
            CheckId::Types,
            CheckId::Tests,
            CheckId::SqliteDrift,
            CheckId::PgDrift,
            CheckId::DockerSmoke,
            CheckId::CiMirror,
        ] {
            registry.register(id, default_check(id));
        }
        registry
    }

    /// Installs or replaces the implementation for a slot
    pub fn register(&mut self, id: CheckId, check: Arc<dyn Check>) -> &mut Self {
        self.checks.insert(id, check);
        self
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with(mut self, id: CheckId, check: impl Check + 'static) -> Self {
        self.checks.insert(id, Arc::new(check));
        self
    }

    /// Looks up the implementation for a slot
    #[must_use]
    pub fn get(&self, id: CheckId) -> Option<&Arc<dyn Check>> {
        self.checks.get(&id)
    }
}

/// Derived verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// True when nothing failed
    pub ok: bool,
    /// Human label
    pub label: &'static str,
}

impl Verdict {
    /// Process exit status for this verdict
    #[must_use]
    pub fn exit_code(self) -> u8 {
        u8::from(!self.ok)
    }

    /// Label with its status mark
    #[must_use]
    pub fn decorated(self) -> String {
        let mark = if self.ok { "✅" } else { "❌" };
        format!("{} {mark}", self.label)
    }
}

/// Results of one gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    /// Gate that ran
    pub gate: GateKind,
    /// Results in task order, named by task label
    pub results: Vec<GateResult>,
    /// True iff no result is FAIL
    pub overall_ok: bool,
}

impl GateOutcome {
    /// Verdict for this gate
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        let label = match (self.overall_ok, self.gate) {
            (false, _) => "BLOCKED",
            (true, GateKind::PreCommit) => "SAFE TO COMMIT",
            (true, GateKind::PrePush) => "SAFE TO PUSH",
        };
        Verdict {
            ok: self.overall_ok,
            label,
        }
    }
}

/// Results of every gate, run in sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllGatesOutcome {
    /// Per-gate outcomes, pre-commit first
    pub gates: Vec<GateOutcome>,
    /// True iff every gate passed
    pub ok: bool,
}

impl AllGatesOutcome {
    /// All results, flattened in gate order
    pub fn results(&self) -> impl Iterator<Item = &GateResult> {
        self.gates.iter().flat_map(|g| g.results.iter())
    }

    /// Verdict across every gate
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        Verdict {
            ok: self.ok,
            label: if self.ok { "SAFE" } else { "BLOCKED" },
        }
    }
}

/// Runs gates against a check registry
#[derive(Debug, Clone)]
pub struct GateRunner {
    registry: CheckRegistry,
    ctx: CheckContext,
}

impl GateRunner {
    /// Creates a runner with the built-in checks
    #[must_use]
    pub fn new(ctx: CheckContext) -> Self {
        Self::with_registry(ctx, CheckRegistry::with_defaults())
    }

    /// Creates a runner with a custom registry
    #[must_use]
    pub fn with_registry(ctx: CheckContext, registry: CheckRegistry) -> Self {
        Self { registry, ctx }
    }

    /// Mutable access to the registry
    pub fn registry_mut(&mut self) -> &mut CheckRegistry {
        &mut self.registry
    }

    /// Runs every task of the gate, in order
    #[must_use]
    pub fn run_gate(&self, gate: GateKind) -> GateOutcome {
        tracing::info!(gate = %gate, "Running gate");

        let results: Vec<GateResult> = gate
            .tasks()
            .iter()
            .map(|task| {
                let mut result = self.run_check(task.check);
                tracing::info!(
                    gate = %gate,
                    check = task.check.name(),
                    status = %result.status,
                    "Check finished"
                );
                result.name = task.label.to_string();
                result
            })
            .collect();

        let overall_ok = !results.iter().any(GateResult::is_failure);
        GateOutcome {
            gate,
            results,
            overall_ok,
        }
    }

    /// Runs pre-commit then pre-push
    #[must_use]
    pub fn run_all_gates(&self) -> AllGatesOutcome {
        let gates: Vec<GateOutcome> = GateKind::ALL.iter().map(|&g| self.run_gate(g)).collect();
        let ok = gates.iter().all(|g| g.overall_ok);
        AllGatesOutcome { gates, ok }
    }

    fn run_check(&self, id: CheckId) -> GateResult {
        let name = id.name();
        let Some(check) = self.registry.get(id) else {
            tracing::warn!(check = name, "No implementation registered");
            return GateResult::skipped(name, "not registered").with_details(format!(
                "{name}: SKIPPED because no implementation is registered for this check.\n"
            ));
        };

        match catch_unwind(AssertUnwindSafe(|| check.run(&self.ctx))) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!(check = name, error = %e, "Check raised an error");
                exception_result(name, format!("{e:#}"))
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "check panicked".to_string());
                tracing::warn!(check = name, panic = %message, "Check panicked");
                exception_result(name, message)
            }
        }
    }
}

fn exception_result(name: &str, message: String) -> GateResult {
    GateResult {
        name: name.to_string(),
        status: GateStatus::Fail,
        info: "exception".to_string(),
        details: message.clone(),
        returncode: None,
        stdout: None,
        stderr: Some(message),
    }
}
