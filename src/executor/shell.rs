//! Host process execution
//!
//! [`HostRunner`] is the default [`CommandRunner`]: it spawns a real
//! process, waits for it and captures stdout/stderr in full. There is no
//! timeout and no streaming; the caller blocks for the whole process
//! lifetime.
//!
//! ```rust
//! use preflight::{CommandLine, CommandRunner, Environment, HostRunner};
//!
//! let runner = HostRunner::new();
//! let output = runner.run(&CommandLine::shell("echo hello"), &Environment::new()).unwrap();
//! assert!(output.stdout.contains("hello"));
//! ```

use super::traits::{CommandLine, CommandOutput, CommandRunner};
use crate::plan::{Environment, RunError};
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Runs commands as host processes
#[derive(Debug, Clone)]
pub struct HostRunner {
    /// Working directory (`None` = inherit)
    cwd: Option<PathBuf>,

    /// Shell used for [`CommandLine::Shell`] (default: sh)
    shell: String,
}

impl HostRunner {
    /// Creates a runner using `sh` in the current directory
    #[must_use]
    pub fn new() -> Self {
        Self {
            cwd: None,
            shell: "sh".to_string(),
        }
    }

    /// Sets the working directory
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Sets the shell to use
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    fn build(&self, command: &CommandLine) -> Result<(Command, String), RunError> {
        let (mut cmd, program) = match command {
            CommandLine::Shell(line) => {
                if line.trim().is_empty() {
                    return Err(RunError::EmptyCommand);
                }
                let mut cmd = Command::new(&self.shell);
                cmd.arg("-c").arg(line);
                (cmd, self.shell.clone())
            }
            CommandLine::Argv(parts) => {
                let Some((program, args)) = parts.split_first() else {
                    return Err(RunError::EmptyCommand);
                };
                let mut cmd = Command::new(program);
                cmd.args(args);
                (cmd, program.clone())
            }
        };

        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        Ok((cmd, program))
    }
}

impl Default for HostRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for HostRunner {
    fn run(&self, command: &CommandLine, env: &Environment) -> Result<CommandOutput, RunError> {
        let (mut cmd, program) = self.build(command)?;
        cmd.envs(env);

        tracing::debug!(command = %command, "Executing command");

        let start = Instant::now();
        let output = cmd.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RunError::ToolMissing { program },
            _ => RunError::from(e),
        })?;
        let duration = start.elapsed();

        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(
            command = %command,
            exit_code,
            duration_ms = duration.as_millis(),
            "Command finished"
        );

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration,
        })
    }
}
