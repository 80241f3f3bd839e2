//! Destructive-command guard
//!
//! A case-insensitive substring deny-list applied before any plan step is
//! spawned. This is a tripwire for obviously destructive commands copied
//! from a pipeline, not a sandbox: obfuscated or equivalent commands pass.

use thiserror::Error;

/// Deny-listed substrings, compared against the lowercased command.
pub const DENY_LIST: &[&str] = &[
    "rm -rf /",
    "rm -rf ~",
    "shutdown",
    "reboot",
    ":(){ :|:& };:",
    ":(){:|:&};:",
    "mkfs",
];

/// A command was refused by the safety filter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Command blocked by safety policy (matched '{pattern}')")]
pub struct SafetyRejection {
    /// The deny-list entry that matched.
    pub pattern: &'static str,
}

/// Stateless safety filter
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyFilter;

impl SafetyFilter {
    /// Checks a command against the deny-list
    ///
    /// # Errors
    ///
    /// Returns the first matching deny-list entry as a [`SafetyRejection`].
    pub fn check(self, command: &str) -> Result<(), SafetyRejection> {
        let lowered = command.to_lowercase();
        match DENY_LIST.iter().copied().find(|bad| lowered.contains(bad)) {
            Some(pattern) => Err(SafetyRejection { pattern }),
            None => Ok(()),
        }
    }
}

/// Returns true if the command does not match the deny-list
#[must_use]
pub fn is_safe(command: &str) -> bool {
    SafetyFilter.check(command).is_ok()
}
