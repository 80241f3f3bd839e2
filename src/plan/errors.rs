//! Error types for plan building and command invocation

use thiserror::Error;

/// Errors that can occur while turning workflow sources into a plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A decoded source did not have the expected shape
    #[error("Malformed source '{source_name}': {reason}")]
    Malformed {
        /// Name of the offending source.
        source_name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A workflow file or directory could not be read
    #[error("Cannot read '{path}': {reason}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying IO error.
        reason: String,
    },

    /// A workflow file is not valid YAML
    #[error("Invalid YAML in '{path}': {reason}")]
    Yaml {
        /// Path that failed to parse.
        path: String,
        /// Parser message.
        reason: String,
    },
}

/// Errors raised by a [`CommandRunner`](crate::executor::CommandRunner) before a
/// command produced an exit code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The referenced program is not installed or not on `PATH`
    #[error("'{program}' was not found on PATH")]
    ToolMissing {
        /// Program that could not be spawned.
        program: String,
    },

    /// Nothing to execute
    #[error("Empty command")]
    EmptyCommand,

    /// Spawning or waiting on the process failed
    #[error("IO error: {0}")]
    Io(String),
}

impl RunError {
    /// Returns true if the failure means "tool not installed"
    #[must_use]
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, Self::ToolMissing { .. })
    }
}

impl From<std::io::Error> for RunError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
