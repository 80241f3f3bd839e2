//! preflight - run your CI locally before you push
//!
//! ## Commands
//!
//! - `preflight run --gate pre-commit` - Lint, types, tests, drift probes and a CI dry-run
//! - `preflight run --gate pre-push` - The pre-commit gate plus Postgres drift and Docker smoke
//! - `preflight mirror-ci` - List the steps of `.github/workflows`, or run them with `--run`
//! - `preflight doctor` - Project health report
//! - `preflight install-hooks` - Install git hooks that run the gates
//! - `preflight completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Install the git hooks
//! preflight install-hooks
//!
//! # Run the full pre-push gate as JSON
//! preflight run --gate pre-push --json
//!
//! # Run the CI workflows locally, stopping at the first failing step
//! PREFLIGHT_LICENSE_KEY=... preflight mirror-ci --run
//! ```
//!
//! Set `PREFLIGHT_DEBUG=1` (or pass `--verbose`) to get tracing output on stderr.

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var_os(cli::DEBUG_ENV).is_some() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
