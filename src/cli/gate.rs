//! `preflight run` - run the gates

use super::GateArg;
use anyhow::Result;
use preflight::executor::HostRunner;
use preflight::gate::{
    CheckContext, GateKind, GateResult, GateResultJson, GateRunner, Verdict, format_summary,
    verbose_details,
};
use preflight::infrastructure::Config;
use preflight::infrastructure::license::{Authorization, Authorizer, KeyAuthorizer};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// Options of `preflight run`
#[derive(Debug, Clone)]
pub struct GateOptions {
    /// Gate selection
    pub gate: GateArg,
    /// Print JSON
    pub json: bool,
    /// Refuse to run without a valid license key
    pub require_license: bool,
    /// License key
    pub license_key: Option<String>,
}

/// Runs the selected gate(s) and prints the outcome
pub fn run_gate_command(root: &Path, config: Config, options: &GateOptions) -> Result<bool> {
    if options.require_license {
        let auth = KeyAuthorizer::from_config(&config.license);
        if let Authorization::Denied { reason } = auth.authorize(options.license_key.as_deref()) {
            if options.json {
                println!("{}", json!({ "ok": false, "error": reason }));
            } else {
                eprintln!("License check failed: {reason}");
            }
            return Ok(false);
        }
    }

    let runner = HostRunner::new().with_cwd(root);
    let ctx = CheckContext::new(root, Arc::new(runner), config).with_process_env();
    let gates = GateRunner::new(ctx);

    let (gate_name, results, verdict): (&str, Vec<GateResult>, Verdict) = match options.gate {
        GateArg::PreCommit | GateArg::PrePush => {
            let kind = if options.gate == GateArg::PreCommit {
                GateKind::PreCommit
            } else {
                GateKind::PrePush
            };
            let outcome = gates.run_gate(kind);
            let verdict = outcome.verdict();
            (kind.as_str(), outcome.results, verdict)
        }
        GateArg::All => {
            let outcome = gates.run_all_gates();
            let verdict = outcome.verdict();
            ("all", outcome.results().cloned().collect(), verdict)
        }
    };

    if options.json {
        println!("{}", render_json(gate_name, &results, verdict)?);
    } else {
        println!("{}", format_summary(&results, verdict));
        let details = verbose_details(&results);
        if !details.is_empty() {
            println!("\n{}", details.trim_end());
        }
    }

    Ok(verdict.ok)
}

fn render_json(gate: &str, results: &[GateResult], verdict: Verdict) -> Result<String> {
    let results: Vec<GateResultJson> = results.iter().map(GateResultJson::from).collect();
    Ok(serde_json::to_string_pretty(&json!({
        "gate": gate,
        "ok": verdict.ok,
        "verdict": verdict.label,
        "results": results,
    }))?)
}
