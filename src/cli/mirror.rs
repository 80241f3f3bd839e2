//! `preflight mirror-ci` - dry-run or execute the CI workflows locally

use anyhow::{Context, Result};
use preflight::executor::{ExecutionMode, HostRunner, PlanExecutor};
use preflight::infrastructure::Config;
use preflight::infrastructure::github_actions::build_plan;
use preflight::infrastructure::license::KeyAuthorizer;
use preflight::plan::{InterpreterOverride, Plan};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Options of `preflight mirror-ci`
#[derive(Debug, Clone, Default)]
pub struct MirrorOptions {
    /// Execute instead of listing
    pub run: bool,
    /// Continue past failures
    pub bulk: bool,
    /// License key
    pub license_key: Option<String>,
    /// Print JSON
    pub json: bool,
    /// Interpreter that replaces `python`/`pytest` in step commands
    pub python: Option<String>,
}

/// Lists or runs the plan built from `<root>/.github/workflows`
pub fn mirror_ci(root: &Path, config: &Config, options: &MirrorOptions) -> Result<bool> {
    let plan = build_plan(root, &config.normalizer)
        .with_context(|| format!("Failed to load workflows under {}", root.display()))?;
    let interpreter = options.python.as_deref().and_then(InterpreterOverride::new);
    let plan = match &interpreter {
        Some(interpreter) => interpreter.apply(plan),
        None => plan,
    };

    if !options.run {
        if options.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print!("{}", listing(&plan, interpreter.as_ref()));
        }
        return Ok(true);
    }

    let mode = if options.bulk {
        ExecutionMode::Bulk
    } else {
        ExecutionMode::EarlyStop
    };
    let executor = PlanExecutor::new(
        Arc::new(HostRunner::new().with_cwd(root)),
        Arc::new(KeyAuthorizer::from_config(&config.license)),
    )
    .with_mode(mode);

    let report = executor.execute(&plan, options.license_key.as_deref());

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(report.ok)
}

/// Dry-run listing of the plan
pub fn listing(plan: &Plan, interpreter: Option<&InterpreterOverride>) -> String {
    let mut out = String::new();
    if let Some(interpreter) = interpreter {
        let _ = writeln!(out, "Using interpreter: {}", interpreter.python());
    }
    out.push_str(&plan.describe());
    out
}
