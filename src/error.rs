use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::vcs::Vcs;

pub type Result<T, E = GomError> = std::result::Result<T, E>;

/// Error type for manifest, staleness and toolchain operations
#[derive(Error, Debug)]
pub enum GomError {
    #[error("Can't locate {file} in {} or any parent directory", start.display())]
    ManifestNotFound { file: &'static str, start: PathBuf },

    #[error("Syntax error in {} at line {line}: {message}", path.display())]
    ManifestParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("[{name}] {reason}. Dependencies staled. Run `gom install` to fix the issue")]
    StaleDependencies { name: String, reason: StaleReason },

    #[error("{vcs} failed in {}: {message}", path.display())]
    Vcs {
        vcs: Vcs,
        path: PathBuf,
        message: String,
    },

    #[error("[{name}] Don't know how to checkout {target}: gom supports git/hg/bzr for tag/branch/commit")]
    UnsupportedCheckout { name: String, target: String },

    #[error("Command `{command}` failed: {status}")]
    CommandFailed { command: String, status: String },

    #[error("No command given")]
    EmptyCommand,

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GomError {
    pub fn is_stale(&self) -> bool {
        matches!(self, GomError::StaleDependencies { .. })
    }
}

/// Why a vendored dependency failed the staleness gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// `vendor/src/<name>` is not a directory
    VendorMissing { path: PathBuf },
    /// The checkout is at a different revision than the pin
    RevisionMismatch { expected: String, actual: String },
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::VendorMissing { path } => {
                write!(f, "vendored checkout missing at {}", path.display())
            }
            StaleReason::RevisionMismatch { expected, actual } => {
                write!(f, "checked out {} but Gomfile pins {}", actual, expected)
            }
        }
    }
}
