//! Prelude module for common imports

pub use crate::plan::{
    Environment, Job, JobSource, Normalizer, NormalizerRules, Plan, PlanError, RunError, Step,
    StepOrigin, StepSource, WorkflowSource,
};

pub use crate::executor::{
    CommandLine, CommandOutput, CommandRunner, ExecutionMode, ExecutionRecord, ExecutionReport,
    FailedAt, FailureForensics, HostRunner, PlanExecutor, SafetyFilter, SafetyRejection, StepStatus,
};

pub use crate::gate::{
    Check, CheckContext, CheckId, CheckRegistry, GateKind, GateOutcome, GateResult, GateRunner,
    GateStatus, Verdict,
};

pub use crate::infrastructure::license::{AlwaysGranted, Authorization, Authorizer, KeyAuthorizer};
pub use crate::infrastructure::quickfix::{HintProvider, NoHints};
pub use crate::infrastructure::Config;
