//! Backends driven through their command-line tools.

use std::path::Path;
use std::process::{Command, Output};
use std::sync::LazyLock;

use regex::Regex;

use super::Vcs;
use crate::error::{GomError, Result};

/// `hg id -i` appends `+` to a dirty working copy.
pub(super) static HG_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^+]+").expect("hg node regex"));
pub(super) static BZR_REVNO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("bzr revno regex"));

fn output(vcs: Vcs, root: &Path, args: &[&str]) -> Result<Output> {
    tracing::debug!(%vcs, ?args, dir = %root.display(), "running vcs command");
    let output = Command::new(vcs.program())
        .args(args)
        .current_dir(root)
        .output()
        .map_err(|e| vcs_error(vcs, root, format!("failed to run {}: {}", vcs.program(), e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(vcs_error(
            vcs,
            root,
            format!("`{} {}` exited with {}: {}", vcs.program(), args.join(" "), output.status, stderr.trim()),
        ));
    }
    Ok(output)
}

pub(super) fn run(vcs: Vcs, root: &Path, args: &[&str]) -> Result<()> {
    output(vcs, root, args).map(|_| ())
}

/// Runs a revision query and keeps the first match of `mask` in its output.
pub(super) fn revision(vcs: Vcs, root: &Path, args: &[&str], mask: &Regex) -> Result<String> {
    let output = output(vcs, root, args)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    extract_revision(stdout.trim(), mask)
        .ok_or_else(|| vcs_error(vcs, root, format!("unexpected revision output `{}`", stdout.trim())))
}

fn extract_revision(text: &str, mask: &Regex) -> Option<String> {
    mask.find(text).map(|m| m.as_str().to_string())
}

fn vcs_error(vcs: Vcs, root: &Path, message: String) -> GomError {
    GomError::Vcs {
        vcs,
        path: root.to_path_buf(),
        message,
    }
}
