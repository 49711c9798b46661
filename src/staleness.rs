//! Staleness gate for vendored dependencies.
//!
//! Before `gom build`, `gom test`, `gom run` and `gom exec` touch the Go
//! toolchain, every dependency in the working set is checked against its
//! vendored checkout, in manifest order:
//!
//! | State            | When                                  | Result          |
//! |------------------|---------------------------------------|-----------------|
//! | NoCommitDeclared | no `:commit` pin                      | warning, passes |
//! | VendorMissing    | `vendor/src/<name>` is not a directory| stale, stop     |
//! | VcsUnknown       | no marker below the vendor root       | warning, passes |
//! | RevisionMismatch | checked-out revision differs from pin | stale, stop     |
//! | Match            | checked-out revision equals pin       | passes          |
//!
//! The first stale dependency aborts the check.

use colored::*;

use crate::error::{GomError, Result, StaleReason};
use crate::manifest::DependencySpec;
use crate::vcs::{self, Detection, Vcs, VcsDriver};
use crate::vendor::VendorStore;

/// Terminal state of a dependency that passed the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyState {
    NoCommitDeclared,
    VcsUnknown,
    Match { vcs: Vcs, revision: String },
}

impl DependencyState {
    /// Diagnostic line for the non-fatal states.
    pub fn warning(&self, name: &str) -> Option<String> {
        match self {
            DependencyState::NoCommitDeclared => Some(format!(
                "[{}] No commit set. Please set a revision with :commit => 'SHA1'",
                name
            )),
            DependencyState::VcsUnknown => Some(format!(
                "[{}] Unable to check the revision. Reason: unknown VCS",
                name
            )),
            DependencyState::Match { .. } => None,
        }
    }
}

/// Per-dependency results of a passing check, in evaluation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StalenessReport {
    pub entries: Vec<(String, DependencyState)>,
}

impl StalenessReport {
    pub fn warnings(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|(name, state)| state.warning(name))
            .collect()
    }

    pub fn state_of(&self, name: &str) -> Option<&DependencyState> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, state)| state)
    }
}

pub struct StalenessChecker<'a, R> {
    vendor: &'a VendorStore,
    driver: R,
}

impl<'a, R: VcsDriver> StalenessChecker<'a, R> {
    pub fn new(vendor: &'a VendorStore, driver: R) -> Self {
        Self { vendor, driver }
    }

    /// Checks `deps` in order and stops at the first stale one.
    pub fn check<'d, I>(&self, deps: I) -> Result<StalenessReport>
    where
        I: IntoIterator<Item = &'d DependencySpec>,
    {
        let mut report = StalenessReport::default();
        for dep in deps {
            let state = self.evaluate(dep)?;
            if let Some(warning) = state.warning(&dep.name) {
                tracing::debug!(name = %dep.name, ?state, "passed with a warning");
                println!("{} {}", "!".yellow(), warning);
            }
            report.entries.push((dep.name.clone(), state));
        }
        tracing::info!(checked = report.entries.len(), "vendored dependencies are up to date");
        Ok(report)
    }

    /// Runs the state machine for a single dependency.
    pub fn evaluate(&self, dep: &DependencySpec) -> Result<DependencyState> {
        let Some(commit) = dep.commit() else {
            return Ok(DependencyState::NoCommitDeclared);
        };

        let path = self.vendor.package_dir(&dep.name);
        if !path.is_dir() {
            tracing::debug!(name = %dep.name, path = %path.display(), "vendored checkout missing");
            return Err(GomError::StaleDependencies {
                name: dep.name.clone(),
                reason: StaleReason::VendorMissing { path },
            });
        }

        let (vcs, root) = match vcs::detect(self.vendor.root(), &path) {
            Detection::Found { vcs, root } => (vcs, root),
            Detection::Unknown => return Ok(DependencyState::VcsUnknown),
        };

        let revision = self.driver.revision(vcs, &root)?;
        if revision != commit {
            return Err(GomError::StaleDependencies {
                name: dep.name.clone(),
                reason: StaleReason::RevisionMismatch {
                    expected: commit.to_string(),
                    actual: revision,
                },
            });
        }
        Ok(DependencyState::Match { vcs, revision })
    }
}
