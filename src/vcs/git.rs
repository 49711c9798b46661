use std::path::Path;

use git2::Repository;

use crate::error::Result;

/// Commit id of `HEAD` for the repository at `root`.
pub(super) fn head_revision(root: &Path) -> Result<String> {
    let repo = Repository::open(root)?;
    let commit = repo.head()?.peel_to_commit()?;
    Ok(commit.id().to_string())
}
