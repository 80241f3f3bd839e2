//! Remediation hints for failing steps
//!
//! The plan executor asks a [`HintProvider`] for a one-line suggestion when
//! it captures the first failure. Providers are best-effort: `None` means
//! "no specific advice" and the executor falls back to a generic hint.

/// Hint used when no provider has specific advice.
pub const GENERIC_HINT: &str = "Run the failing command locally to reproduce and fix it.";

/// Hint used when the provider itself blew up.
pub const PROVIDER_FAILED_HINT: &str =
    "This is the first failing step. Fix this step to unblock CI.";

/// Produces a remediation hint for a failing command
pub trait HintProvider: Send + Sync {
    /// Suggests a fix for the command given its captured output
    fn suggest(&self, command: &str, stdout: &str, stderr: &str) -> Option<String>;
}

/// Provider with no advice; the executor default
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHints;

impl HintProvider for NoHints {
    fn suggest(&self, _command: &str, _stdout: &str, _stderr: &str) -> Option<String> {
        None
    }
}

impl<F> HintProvider for F
where
    F: Fn(&str, &str, &str) -> Option<String> + Send + Sync,
{
    fn suggest(&self, command: &str, stdout: &str, stderr: &str) -> Option<String> {
        self(command, stdout, stderr)
    }
}

/// Asks the provider for a hint, falling back to the generic hints
///
/// A panicking provider never takes the run down with it.
#[must_use]
pub fn resolve_hint(provider: &dyn HintProvider, command: &str, stdout: &str, stderr: &str) -> String {
    let suggestion = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        provider.suggest(command, stdout, stderr)
    }));

    match suggestion {
        Ok(Some(hint)) if !hint.trim().is_empty() => hint,
        Ok(_) => GENERIC_HINT.to_string(),
        Err(_) => {
            tracing::warn!(command = %command, "Hint provider panicked");
            PROVIDER_FAILED_HINT.to_string()
        }
    }
}
