//! Version-control backends for vendored checkouts.
//!
//! Three backends are supported: git, Mercurial and Bazaar. Which one manages
//! a checkout is decided once per dependency by [`detect`], which walks up
//! from the checkout looking for a marker directory. Revision queries then
//! dispatch on the resulting [`Vcs`] tag.

mod command;
mod git;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Supported version-control systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vcs {
    Git,
    Hg,
    Bzr,
}

impl Vcs {
    /// Marker lookup order within a single directory.
    pub const PRECEDENCE: [Vcs; 3] = [Vcs::Git, Vcs::Hg, Vcs::Bzr];

    /// Directory that marks a checkout root
    pub fn marker(self) -> &'static str {
        match self {
            Vcs::Git => ".git",
            Vcs::Hg => ".hg",
            Vcs::Bzr => ".bzr",
        }
    }

    /// Name of the command-line tool
    pub fn program(self) -> &'static str {
        match self {
            Vcs::Git => "git",
            Vcs::Hg => "hg",
            Vcs::Bzr => "bzr",
        }
    }

    /// Identifier of the state currently checked out at `root`.
    pub fn revision(self, root: &Path) -> Result<String> {
        match self {
            Vcs::Git => git::head_revision(root),
            Vcs::Hg => command::revision(self, root, &["id", "-i"], &command::HG_NODE),
            Vcs::Bzr => command::revision(self, root, &["revno"], &command::BZR_REVNO),
        }
    }

    /// Switches the checkout at `root` to `target` (commit, tag or branch).
    pub fn checkout(self, root: &Path, target: &str) -> Result<()> {
        match self {
            Vcs::Git => command::run(self, root, &["checkout", "-q", target]),
            Vcs::Hg => command::run(self, root, &["update", target]),
            Vcs::Bzr => command::run(self, root, &["revert", "-r", target]),
        }
    }

    /// Pulls new history from the default remote.
    pub fn update(self, root: &Path) -> Result<()> {
        match self {
            Vcs::Git => command::run(self, root, &["fetch"]),
            Vcs::Hg | Vcs::Bzr => command::run(self, root, &["pull"]),
        }
    }

    /// Checks out `target`, pulling first if it is not known locally yet.
    pub fn sync(self, root: &Path, target: &str) -> Result<()> {
        if let Err(err) = self.checkout(root, target) {
            tracing::debug!(vcs = %self, %err, "checkout failed, updating and retrying");
            self.update(root)?;
            self.checkout(root, target)?;
        }
        Ok(())
    }
}

impl fmt::Display for Vcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Outcome of looking for a checkout root above a vendored path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Found { vcs: Vcs, root: PathBuf },
    Unknown,
}

/// Walks upward from `target` looking for a backend marker.
///
/// The walk stops at `vendor_root` without testing it, so a marker in the
/// vendor root itself never counts.
pub fn detect(vendor_root: &Path, target: &Path) -> Detection {
    let mut dir = target;
    loop {
        if dir == vendor_root {
            break;
        }
        for vcs in Vcs::PRECEDENCE {
            if dir.join(vcs.marker()).is_dir() {
                tracing::debug!(%vcs, root = %dir.display(), "detected checkout");
                return Detection::Found {
                    vcs,
                    root: dir.to_path_buf(),
                };
            }
        }
        match dir.parent() {
            Some(parent) if parent != dir => dir = parent,
            _ => break,
        }
    }
    tracing::debug!(target = %target.display(), "no VCS marker below vendor root");
    Detection::Unknown
}

/// Operations the staleness gate and `gom install` need from a backend.
pub trait VcsDriver {
    /// Revision checked out at a detected root.
    fn revision(&self, vcs: Vcs, root: &Path) -> Result<String>;

    fn sync(&self, vcs: Vcs, root: &Path, target: &str) -> Result<()> {
        vcs.sync(root, target)
    }
}

impl<T: VcsDriver + ?Sized> VcsDriver for &T {
    fn revision(&self, vcs: Vcs, root: &Path) -> Result<String> {
        (**self).revision(vcs, root)
    }

    fn sync(&self, vcs: Vcs, root: &Path, target: &str) -> Result<()> {
        (**self).sync(vcs, root, target)
    }
}

/// Drives the real backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVcs;

impl VcsDriver for SystemVcs {
    fn revision(&self, vcs: Vcs, root: &Path) -> Result<String> {
        vcs.revision(root)
    }
}
