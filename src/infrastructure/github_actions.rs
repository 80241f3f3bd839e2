//! GitHub Actions workflow loader
//!
//! Reads `.github/workflows/*.yml` and `*.yaml` into raw YAML documents and
//! feeds them to the plan normalizer. Loading is best-effort: a file that
//! cannot be read or parsed is logged and skipped.

use crate::plan::{Normalizer, NormalizerRules, Plan, PlanError};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Workflow directory relative to a repository root
pub const WORKFLOWS_DIR: &str = ".github/workflows";

/// Resolves the workflow directory for `root`
///
/// `root` may be a repository root or the workflow directory itself.
#[must_use]
pub fn workflows_dir(root: &Path) -> Option<PathBuf> {
    let nested = root.join(WORKFLOWS_DIR);
    if nested.is_dir() {
        return Some(nested);
    }
    if root.is_dir() && root.ends_with(WORKFLOWS_DIR) {
        return Some(root.to_path_buf());
    }
    None
}

/// Lists workflow files: sorted `*.yml`, then sorted `*.yaml`
///
/// # Errors
///
/// Returns [`PlanError::Io`] if the workflow directory exists but cannot be
/// listed.
pub fn collect_workflow_files(root: &Path) -> Result<Vec<PathBuf>, PlanError> {
    let Some(dir) = workflows_dir(root) else {
        return Ok(Vec::new());
    };

    let entries = std::fs::read_dir(&dir).map_err(|e| PlanError::Io {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(order_workflow_files(
        &dir,
        entries.map(|entry| entry.map(|e| e.path())),
    ))
}

/// Sorted `*.yml` files, then sorted `*.yaml` files; unreadable entries are logged
fn order_workflow_files(
    dir: &Path,
    entries: impl Iterator<Item = std::io::Result<PathBuf>>,
) -> Vec<PathBuf> {
    let mut yml = Vec::new();
    let mut yaml = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("yml") => yml.push(path),
            Some("yaml") => yaml.push(path),
            _ => {}
        }
    }
    yml.sort();
    yaml.sort();
    yml.extend(yaml);
    yml
}

/// Reads every workflow file as a `(source name, document)` pair
///
/// # Errors
///
/// Returns [`PlanError::Io`] if the workflow directory cannot be listed.
/// Individual bad files are skipped with a warning.
pub fn load_workflows(root: &Path) -> Result<Vec<(String, Value)>, PlanError> {
    let files = collect_workflow_files(root)?;
    let mut documents = Vec::with_capacity(files.len());

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable workflow");
                continue;
            }
        };

        match serde_yaml::from_str::<Value>(&text) {
            Ok(doc) => documents.push((name, doc)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping invalid workflow YAML");
            }
        }
    }

    tracing::debug!(count = documents.len(), "Loaded workflow documents");
    Ok(documents)
}

/// Loads the workflows under `root` and normalizes them into a plan
///
/// # Errors
///
/// Returns [`PlanError::Io`] if the workflow directory cannot be listed.
pub fn build_plan(root: &Path, rules: &NormalizerRules) -> Result<Plan, PlanError> {
    let documents = load_workflows(root)?;
    Ok(Normalizer::new(rules.clone()).normalize_documents(documents))
}
