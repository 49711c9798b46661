//! Vendor directory layout.
//!
//! Every project vendors its dependencies into an isolated GOPATH:
//!
//! ```text
//! <vendor root>/src/<name>   checked-out dependency
//! <vendor root>/bin          binaries installed by `go install`
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const DEFAULT_VENDOR_NAME: &str = "_vendor";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorStore {
    root: PathBuf,
}

impl VendorStore {
    /// Resolves `vendor_name` against the project directory. An absolute
    /// name is used as is; `.` vendors straight into the project.
    pub fn for_project(project_dir: &Path, vendor_name: &str) -> Result<Self> {
        let joined = project_dir.join(vendor_name);
        let root = normalize(&std::path::absolute(joined)?);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Where dependency `name` is checked out.
    pub fn package_dir(&self, name: &str) -> PathBuf {
        name.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.src_dir(), |dir, part| dir.join(part))
    }

    /// Creates the root, `src` and `bin` directories.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(self.src_dir())?;
        fs::create_dir_all(self.bin_dir())?;
        Ok(())
    }

    /// `GOPATH` for building the project: vendor first, then the project,
    /// then whatever the caller already had.
    pub fn project_gopath(&self, project_dir: &Path, inherited: Option<OsString>) -> Result<OsString> {
        let mut paths = vec![self.root.clone(), project_dir.to_path_buf()];
        if let Some(inherited) = inherited {
            paths.extend(std::env::split_paths(&inherited));
        }
        Ok(std::env::join_paths(paths).map_err(std::io::Error::other)?)
    }

    /// `PATH` with the vendor `bin` directory appended.
    pub fn search_path(&self, inherited: Option<OsString>) -> Result<OsString> {
        let mut paths: Vec<PathBuf> = inherited
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();
        paths.push(self.bin_dir());
        Ok(std::env::join_paths(paths).map_err(std::io::Error::other)?)
    }
}

// Drops `.` components so the root compares equal to paths built from it.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let store = VendorStore::for_project(Path::new("/work/app"), DEFAULT_VENDOR_NAME).unwrap();
        assert_eq!(store.root(), Path::new("/work/app/_vendor"));
        assert_eq!(store.bin_dir(), Path::new("/work/app/_vendor/bin"));
        assert_eq!(
            store.package_dir("github.com/mattn/go-scan"),
            Path::new("/work/app/_vendor/src/github.com/mattn/go-scan")
        );
    }

    #[test]
    fn test_dot_vendor_name_is_project_dir() {
        let store = VendorStore::for_project(Path::new("/work/app"), ".").unwrap();
        assert_eq!(store.root(), Path::new("/work/app"));
    }

    #[test]
    fn test_absolute_vendor_name_wins() {
        let store = VendorStore::for_project(Path::new("/work/app"), "/opt/gopath").unwrap();
        assert_eq!(store.root(), Path::new("/opt/gopath"));
    }

    #[test]
    fn test_environment_paths() {
        let store = VendorStore::for_project(Path::new("/work/app"), "_vendor").unwrap();
        let gopath = store
            .project_gopath(Path::new("/work/app"), Some(OsString::from("/home/me/go")))
            .unwrap();
        let parts: Vec<PathBuf> = std::env::split_paths(&gopath).collect();
        assert_eq!(
            parts,
            vec![
                PathBuf::from("/work/app/_vendor"),
                PathBuf::from("/work/app"),
                PathBuf::from("/home/me/go"),
            ]
        );

        let path = store.search_path(None).unwrap();
        assert_eq!(
            std::env::split_paths(&path).collect::<Vec<_>>(),
            vec![PathBuf::from("/work/app/_vendor/bin")]
        );
    }
}
