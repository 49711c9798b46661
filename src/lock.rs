//! `Gomfile.lock` generation.
//!
//! The lock file is an ordinary Gomfile in which every vendored dependency
//! carries a `:commit` pin taken from its checkout. When it exists
//! `gom install` works from it instead of the Gomfile; the staleness gate
//! always reads the Gomfile.

use std::fs;
use std::path::PathBuf;

use colored::*;

use crate::error::Result;
use crate::manifest::{self, DependencySpec, LOCK_FILE};
use crate::orchestrator::Project;
use crate::vcs::{self, Detection, VcsDriver};
use crate::vendor::VendorStore;

/// Pins every entry of the project's Gomfile and writes `Gomfile.lock`.
pub fn generate<V: VcsDriver>(project: &Project, driver: V) -> Result<PathBuf> {
    // Always start from the Gomfile, never from a previous lock.
    let mut deps = manifest::parse_file(project.manifest())?;
    let pinned = pin_revisions(&mut deps, project.vendor(), &driver);

    let path = project.dir().join(LOCK_FILE);
    fs::write(&path, manifest::render(&deps))?;
    println!(
        "{} Wrote {} ({} of {} pinned)",
        "✓".green(),
        LOCK_FILE,
        pinned,
        deps.len()
    );
    Ok(path)
}

/// Sets `commit` on each entry whose checkout revision can be read.
/// Returns how many entries were pinned.
pub fn pin_revisions<V: VcsDriver>(
    deps: &mut [DependencySpec],
    vendor: &VendorStore,
    driver: &V,
) -> usize {
    let mut pinned = 0;
    for dep in deps.iter_mut() {
        let Detection::Found { vcs, root } = vcs::detect(vendor.root(), &vendor.package_dir(&dep.name))
        else {
            tracing::warn!(name = %dep.name, "no checkout to pin, keeping entry as is");
            continue;
        };
        match driver.revision(vcs, &root) {
            Ok(revision) => {
                tracing::debug!(name = %dep.name, %revision, "pinned");
                dep.set_commit(revision);
                pinned += 1;
            }
            Err(err) => tracing::warn!(name = %dep.name, %err, "could not read revision"),
        }
    }
    pinned
}
