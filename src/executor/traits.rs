//! Command execution traits
//!
//! Both engines receive a [`CommandRunner`] at construction instead of
//! spawning processes themselves, so tests can substitute scripted runners.

use crate::plan::{Environment, RunError};
use std::fmt;
use std::time::Duration;

/// What to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// A shell line, run through the configured shell with `-c`
    Shell(String),
    /// A program and its arguments, spawned directly
    Argv(Vec<String>),
}

impl CommandLine {
    /// Creates a shell command line
    #[must_use]
    pub fn shell(line: impl Into<String>) -> Self {
        Self::Shell(line.into())
    }

    /// Creates a direct program invocation
    #[must_use]
    pub fn argv<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Argv(parts.into_iter().map(Into::into).collect())
    }

    /// The program that will be looked up on `PATH`
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        match self {
            Self::Shell(_) => None,
            Self::Argv(parts) => parts.first().map(String::as_str),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell(line) => f.write_str(line),
            Self::Argv(parts) => f.write_str(&shell_words::join(parts)),
        }
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (`-1` when terminated by a signal)
    pub exit_code: i32,

    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Wall-clock duration
    pub duration: Duration,
}

impl CommandOutput {
    /// Returns true if the process exited with code 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr
    #[must_use]
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Execution strategy shared by the gate runner and the plan executor
pub trait CommandRunner: Send + Sync {
    /// Runs a command to completion and captures its output
    ///
    /// A non-zero exit is a successful invocation; errors are reserved for
    /// commands that could not produce an exit code at all.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::ToolMissing`] when the program is not installed,
    /// [`RunError::EmptyCommand`] for empty input and [`RunError::Io`] for
    /// any other spawn/wait failure.
    fn run(&self, command: &CommandLine, env: &Environment) -> Result<CommandOutput, RunError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for std::sync::Arc<T> {
    fn run(&self, command: &CommandLine, env: &Environment) -> Result<CommandOutput, RunError> {
        (**self).run(command, env)
    }
}
