//! Changed-file test targeting
//!
//! Narrows the test run to modules touched since a base revision by turning
//! changed Python paths into a `pytest -k` selector.

use crate::executor::{CommandLine, CommandRunner};
use crate::plan::Environment;
use std::collections::BTreeSet;
use std::path::Path;

/// Files changed relative to `base`, deduplicated and sorted
///
/// Any git problem (not installed, not a repository, bad revision) yields
/// an empty list, which means "run the full suite".
pub fn changed_files(runner: &dyn CommandRunner, base: &str) -> Vec<String> {
    let command = CommandLine::Argv(vec![
        "git".to_string(),
        "diff".to_string(),
        "--name-only".to_string(),
        base.to_string(),
    ]);

    let output = match runner.run(&command, &Environment::new()) {
        Ok(output) if output.is_success() => output,
        Ok(output) => {
            tracing::debug!(exit_code = output.exit_code, base, "git diff failed, targeting disabled");
            return Vec::new();
        }
        Err(e) => {
            tracing::debug!(error = %e, "git unavailable, targeting disabled");
            return Vec::new();
        }
    };

    output
        .stdout
        .lines()
        .map(|line| line.trim().replace("//", "/"))
        .filter(|line| !line.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Keeps only Python sources
pub fn python_files(paths: &[String]) -> impl Iterator<Item = &str> {
    paths.iter().map(String::as_str).filter(|p| p.ends_with(".py"))
}

/// Builds a `pytest -k` expression from changed paths
///
/// Each Python file contributes its stem and its parent directory name.
/// Returns `None` when nothing qualifies.
#[must_use]
pub fn test_selector(paths: &[String]) -> Option<String> {
    let mut tokens = BTreeSet::new();
    for path in python_files(paths).map(Path::new) {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            tokens.insert(stem.to_string());
        }
        if let Some(parent) = path.parent().and_then(Path::file_name).and_then(|s| s.to_str()) {
            tokens.insert(parent.to_string());
        }
    }

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.into_iter().collect::<Vec<_>>().join(" or "))
    }
}
