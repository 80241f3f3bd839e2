//! `preflight install-hooks` - git hook installation

use anyhow::{Context, Result, bail};
use preflight::gate::GateKind;
use std::fs;
use std::path::{Path, PathBuf};

/// Renders the hook script for a gate
pub fn hook_script(gate: GateKind) -> String {
    format!("#!/bin/sh\n# Installed by preflight\nexec preflight run --gate {gate}\n")
}

/// Writes `.git/hooks/pre-commit` and `.git/hooks/pre-push` under `root`
///
/// Existing hooks are overwritten.
pub fn install_hooks(root: &Path) -> Result<Vec<PathBuf>> {
    let git_dir = root.join(".git");
    if !git_dir.is_dir() {
        bail!("{} is not a git repository (no .git directory)", root.display());
    }

    let hooks_dir = git_dir.join("hooks");
    fs::create_dir_all(&hooks_dir)
        .with_context(|| format!("Failed to create {}", hooks_dir.display()))?;

    let mut installed = Vec::with_capacity(GateKind::ALL.len());
    for gate in GateKind::ALL {
        let path = hooks_dir.join(gate.as_str());
        fs::write(&path, hook_script(gate))
            .with_context(|| format!("Failed to write hook: {}", path.display()))?;
        make_executable(&path)?;
        tracing::info!(hook = %path.display(), "Installed git hook");
        installed.push(path);
    }

    Ok(installed)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to make {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
