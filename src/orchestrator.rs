//! Sequencing of install, build and gated toolchain commands.
//!
//! Everything here is sequential: one dependency at a time, in manifest
//! order, one child process at a time. The first error stops the run and
//! work already done is left in place.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::error::{GomError, Result};
use crate::filter;
use crate::lock;
use crate::manifest::{self, DependencySpec};
use crate::staleness::{StalenessChecker, StalenessReport};
use crate::toolchain::{self, CommandRunner, Invocation, SystemRunner};
use crate::vcs::{self, Detection, SystemVcs, VcsDriver};
use crate::vendor::VendorStore;

/// A located Gomfile with its parsed entries and vendor tree.
///
/// `dependencies` always come from the Gomfile and drive the staleness gate.
/// `install_dependencies` prefer `Gomfile.lock` when one exists.
#[derive(Debug, Clone)]
pub struct Project {
    manifest: PathBuf,
    dir: PathBuf,
    vendor: VendorStore,
    dependencies: Vec<DependencySpec>,
    install_dependencies: Vec<DependencySpec>,
}

impl Project {
    /// Locates the Gomfile from `start` upward and loads it.
    pub fn discover(start: &Path, config: &Config) -> Result<Self> {
        let manifest = manifest::locate(start)?;
        Self::load(manifest, config)
    }

    /// Loads a known Gomfile and, for installs, the lock file beside it.
    pub fn load(manifest: PathBuf, config: &Config) -> Result<Self> {
        let manifest = std::path::absolute(manifest)?;
        let dir = manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let vendor = VendorStore::for_project(&dir, &config.vendor_name)?;
        let dependencies = manifest::parse_file(&manifest)?;
        let install_dependencies = manifest::load(&manifest)?;
        Ok(Self {
            manifest,
            dir,
            vendor,
            dependencies,
            install_dependencies,
        })
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn vendor(&self) -> &VendorStore {
        &self.vendor
    }

    pub fn dependencies(&self) -> &[DependencySpec] {
        &self.dependencies
    }

    /// Entries `gom install` works from: the lock when present.
    pub fn install_dependencies(&self) -> &[DependencySpec] {
        &self.install_dependencies
    }
}

pub struct Orchestrator<R = SystemRunner, V = SystemVcs> {
    project: Project,
    config: Config,
    runner: R,
    vcs: V,
}

impl Orchestrator {
    pub fn new(project: Project, config: Config) -> Self {
        Self::with_backends(project, config, SystemRunner, SystemVcs)
    }
}

impl<R: CommandRunner, V: VcsDriver> Orchestrator<R, V> {
    pub fn with_backends(project: Project, config: Config, runner: R, vcs: V) -> Self {
        Self {
            project,
            config,
            runner,
            vcs,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Gomfile entries that apply to the active environment and platform.
    pub fn working_set(&self) -> Vec<&DependencySpec> {
        self.select(self.project.dependencies())
    }

    /// Like [`Self::working_set`], but lock-first.
    pub fn install_set(&self) -> Vec<&DependencySpec> {
        self.select(self.project.install_dependencies())
    }

    fn select<'a>(&self, deps: &'a [DependencySpec]) -> Vec<&'a DependencySpec> {
        filter::filter(deps, &self.config.environment, &self.config.platform)
    }

    /// Runs the staleness gate over the working set.
    pub fn check(&self) -> Result<StalenessReport> {
        let deps = self.working_set();
        tracing::info!(count = deps.len(), "checking vendored dependencies");
        StalenessChecker::new(self.project.vendor(), &self.vcs).check(deps)
    }

    /// Downloads, pins and installs every dependency of the install set.
    pub fn install(&self, args: &[String]) -> Result<()> {
        let vendor = self.project.vendor();
        vendor.ensure()?;
        let env = toolchain::install_env(vendor);
        let deps = self.install_set();
        tracing::info!(count = deps.len(), vendor = %vendor.root().display(), "installing dependencies");

        for dep in &deps {
            self.fetch(dep, args, &env)?;
        }

        for dep in &deps {
            self.checkout(dep)?;
        }

        self.install_all(&deps, args, &env)
    }

    /// Installs already-vendored dependencies after the gate passes.
    pub fn build_deps(&self, args: &[String]) -> Result<()> {
        self.check()?;
        let vendor = self.project.vendor();
        vendor.ensure()?;
        let env = toolchain::install_env(vendor);
        self.install_all(&self.working_set(), args, &env)
    }

    /// Runs `argv` with the vendor environment once the gate passes.
    pub fn gated(&self, argv: &[String]) -> Result<()> {
        self.check()?;
        self.ungated(argv)
    }

    /// Runs `argv` with the vendor environment, without the gate.
    pub fn ungated(&self, argv: &[String]) -> Result<()> {
        let env = toolchain::project_env(self.project.vendor(), self.project.dir())?;
        self.runner.run(&Invocation::from_argv(argv)?.envs(env))
    }

    /// Writes `Gomfile.lock` beside the Gomfile.
    pub fn lock(&self) -> Result<PathBuf> {
        lock::generate(&self.project, &self.vcs)
    }

    fn fetch(
        &self,
        dep: &DependencySpec,
        args: &[String],
        env: &[(String, OsString)],
    ) -> Result<()> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Downloading {}...", dep.name));
        pb.enable_steady_tick(Duration::from_millis(100));

        match self
            .runner
            .run(&toolchain::fetch(&dep.name, args).envs(env.to_vec()))
        {
            Ok(()) => {
                pb.finish_with_message(format!("{} Downloaded {}", "✓".green(), dep.name));
                Ok(())
            }
            Err(err) => {
                pb.finish_with_message(format!("{} Failed {}", "x".red(), dep.name));
                Err(err)
            }
        }
    }

    fn checkout(&self, dep: &DependencySpec) -> Result<()> {
        let Some(target) = dep.checkout_target() else {
            return Ok(());
        };
        let vendor = self.project.vendor();
        match vcs::detect(vendor.root(), &vendor.package_dir(&dep.name)) {
            Detection::Found { vcs, root } => {
                println!("{} checking out {} at {}", "📌".blue(), dep.name, target);
                self.vcs.sync(vcs, &root, target)
            }
            Detection::Unknown => Err(GomError::UnsupportedCheckout {
                name: dep.name.clone(),
                target: target.to_string(),
            }),
        }
    }

    fn install_all(
        &self,
        deps: &[&DependencySpec],
        args: &[String],
        env: &[(String, OsString)],
    ) -> Result<()> {
        for dep in deps {
            println!("{} installing {}", "🔨".yellow(), dep.name);
            self.runner
                .run(&toolchain::install(&dep.name, args).envs(env.to_vec()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StaleReason;
    use crate::filter::ActiveEnvironment;
    use crate::vcs::Vcs;
    use std::cell::RefCell;
    use std::fs;

    #[derive(Default)]
    struct RecordingRunner {
        runs: RefCell<Vec<Invocation>>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> Result<()> {
            self.runs.borrow_mut().push(invocation.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeVcs {
        revision: String,
        synced: RefCell<Vec<(PathBuf, String)>>,
    }

    impl VcsDriver for FakeVcs {
        fn revision(&self, _vcs: Vcs, _root: &Path) -> Result<String> {
            Ok(self.revision.clone())
        }

        fn sync(&self, _vcs: Vcs, root: &Path, target: &str) -> Result<()> {
            self.synced
                .borrow_mut()
                .push((root.to_path_buf(), target.to_string()));
            Ok(())
        }
    }

    fn orchestrator(
        gomfile: &str,
        config: Config,
        revision: &str,
    ) -> (tempfile::TempDir, Orchestrator<RecordingRunner, FakeVcs>) {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("Gomfile"), gomfile).unwrap();
        let project = Project::discover(tmp.path(), &config).unwrap();
        let vcs = FakeVcs {
            revision: revision.to_string(),
            ..FakeVcs::default()
        };
        let orch = Orchestrator::with_backends(project, config, RecordingRunner::default(), vcs);
        (tmp, orch)
    }

    fn vendor_git_checkout(orch: &Orchestrator<RecordingRunner, FakeVcs>, name: &str) {
        let dir = orch.project().vendor().package_dir(name);
        fs::create_dir_all(dir.join(".git")).unwrap();
    }

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_working_set_respects_groups() {
        let (_tmp, orch) = orchestrator(
            "gom 'a'\ngroup :test do\n  gom 'b'\nend\n",
            Config::default().with_platform("linux"),
            "",
        );
        let names: Vec<&str> = orch.working_set().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a"]);

        let config = Config::new(None, ActiveEnvironment::new(false, false, true, ["ci"]));
        let (_tmp, orch) = orchestrator("gom 'a'\ngroup :test do\n  gom 'b'\nend\n", config, "");
        assert_eq!(orch.working_set().len(), 2);
    }

    #[test]
    fn test_gated_refuses_stale_vendor() {
        let (_tmp, orch) = orchestrator(
            "gom 'github.com/a/b', :commit => 'abc123'\n",
            Config::default(),
            "",
        );
        let err = orch.gated(&argv(&["go", "build"])).unwrap_err();
        assert!(err.is_stale());
        assert!(orch.runner().runs.borrow().is_empty());
    }

    #[test]
    fn test_gated_runs_with_vendor_environment() {
        let (_tmp, orch) = orchestrator(
            "gom 'github.com/a/b', :commit => 'abc123'\n",
            Config::default(),
            "abc123",
        );
        vendor_git_checkout(&orch, "github.com/a/b");

        orch.gated(&argv(&["go", "test", "./..."])).unwrap();
        let runs = orch.runner().runs.borrow();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].command_line(), "go test ./...");
        let gopath = runs[0]
            .envs
            .iter()
            .find(|(k, _)| k == "GOPATH")
            .map(|(_, v)| v.clone())
            .unwrap();
        let first = std::env::split_paths(&gopath).next().unwrap();
        assert_eq!(first, orch.project().vendor().root());
    }

    #[test]
    fn test_install_fetches_checks_out_then_builds() {
        let (_tmp, orch) = orchestrator(
            "gom 'github.com/a/pinned', :tag => 'v1.2'\n\
             gom 'github.com/a/loose'\n",
            Config::default(),
            "",
        );
        vendor_git_checkout(&orch, "github.com/a/pinned");

        orch.install(&[]).unwrap();

        let lines: Vec<String> = orch
            .runner()
            .runs
            .borrow()
            .iter()
            .map(Invocation::command_line)
            .collect();
        assert_eq!(
            lines,
            vec![
                "go get -d github.com/a/pinned",
                "go get -d github.com/a/loose",
                "go install github.com/a/pinned",
                "go install github.com/a/loose",
            ]
        );
        let synced = orch.vcs.synced.borrow();
        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].1, "v1.2");
        assert!(orch.project().vendor().bin_dir().is_dir());
    }

    #[test]
    fn test_install_without_vcs_cannot_checkout() {
        let (_tmp, orch) = orchestrator(
            "gom 'github.com/a/pinned', :commit => 'abc'\n",
            Config::default(),
            "",
        );
        let err = orch.install(&[]).unwrap_err();
        assert!(matches!(err, GomError::UnsupportedCheckout { .. }));
        // Fetch ran, install never did.
        assert_eq!(orch.runner().runs.borrow().len(), 1);
    }

    #[test]
    fn test_gate_reads_gomfile_while_install_reads_lock() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("Gomfile"),
            "gom 'github.com/a/b', :commit => 'bbbb'\ngom 'github.com/a/added'\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("Gomfile.lock"),
            "gom 'github.com/a/b', :commit => 'aaaa'\n",
        )
        .unwrap();
        let config = Config::default();
        let project = Project::discover(tmp.path(), &config).unwrap();
        let vcs = FakeVcs {
            revision: "aaaa".to_string(),
            ..FakeVcs::default()
        };
        let orch = Orchestrator::with_backends(project, config, RecordingRunner::default(), vcs);
        vendor_git_checkout(&orch, "github.com/a/b");

        let names: Vec<&str> = orch.working_set().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["github.com/a/b", "github.com/a/added"]);
        assert_eq!(orch.install_set()[0].commit(), Some("aaaa"));

        match orch.gated(&argv(&["go", "build"])).unwrap_err() {
            GomError::StaleDependencies { name, reason } => {
                assert_eq!(name, "github.com/a/b");
                assert_eq!(
                    reason,
                    StaleReason::RevisionMismatch {
                        expected: "bbbb".into(),
                        actual: "aaaa".into()
                    }
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(orch.runner().runs.borrow().is_empty());

        orch.install(&[]).unwrap();
        let synced = orch.vcs.synced.borrow();
        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].1, "aaaa");
    }

    #[test]
    fn test_build_deps_is_gated() {
        let (_tmp, orch) = orchestrator(
            "gom 'github.com/a/b', :commit => 'abc123'\n",
            Config::default(),
            "fff000",
        );
        vendor_git_checkout(&orch, "github.com/a/b");
        assert!(orch.build_deps(&[]).unwrap_err().is_stale());
        assert!(orch.runner().runs.borrow().is_empty());
    }
}
