//! # Preflight - run your CI locally before you push
//!
//! Preflight turns CI workflow definitions into a flat, ordered plan and
//! runs it on the developer machine, and grades a fixed sequence of local
//! checks into a commit/push verdict.
//!
//! ## Components
//!
//! - [`plan`]: normalizes GitHub Actions style workflows into a [`Plan`]
//! - [`executor`]: runs a plan job by job, stopping at the first failing
//!   step ([`PlanExecutor`]), behind a destructive-command [`SafetyFilter`]
//! - [`gate`]: runs the pre-commit / pre-push check sequences ([`GateRunner`])
//! - [`doctor`]: scores project health from tool invocations
//! - [`infrastructure`]: configuration, logging, workflow loading, licensing
//!   and remediation hints
//!
//! Both engines take a [`CommandRunner`] at construction, so everything can
//! be driven by a scripted runner in tests.
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod doctor;
pub mod executor;
pub mod gate;
pub mod infrastructure;
pub mod plan;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use executor::{
    CommandLine, CommandOutput, CommandRunner, ExecutionMode, ExecutionReport, HostRunner,
    PlanExecutor, SafetyFilter, is_safe,
};
pub use gate::{CheckId, CheckRegistry, GateKind, GateResult, GateRunner, GateStatus};
pub use infrastructure::Config;
pub use plan::{Environment, Job, Normalizer, Plan, PlanError, RunError, Step};

/// Version of the preflight crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
