//! `preflight doctor` - project health report

use anyhow::Result;
use preflight::doctor::{DoctorOptions, SKIP_ENV, SkipPolicy, default_specs, gather, render_markdown};
use preflight::executor::HostRunner;
use preflight::infrastructure::Config;
use std::path::Path;

/// Runs the doctor checks and prints the report
pub fn doctor_command(root: &Path, config: &Config, json: bool, parallel: bool) -> Result<bool> {
    let skip = std::env::var(SKIP_ENV)
        .map(|v| SkipPolicy::parse(&v))
        .unwrap_or_default()
        .with_names(&config.doctor.skip);
    let options = DoctorOptions { parallel, skip };

    let runner = HostRunner::new().with_cwd(root);
    let report = gather(&runner, &default_specs(&config.tools), &options);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_markdown(&report));
    }

    Ok(report.is_healthy())
}
