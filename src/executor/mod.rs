//! Plan execution layer
//!
//! This module contains the process-runner abstraction, the host runner,
//! the safety filter and the adaptive plan executor.

mod plan_executor;
mod safety;
mod shell;
mod traits;

pub use plan_executor::{
    ExecutionMode, ExecutionRecord, ExecutionReport, ExecutionSummary, FailedAt, FailureForensics,
    JobTrace, PlanExecutor, StepStatus,
};
pub use safety::{DENY_LIST, SafetyFilter, SafetyRejection, is_safe};
pub use shell::HostRunner;
pub use traits::{CommandLine, CommandOutput, CommandRunner};
