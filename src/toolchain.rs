//! Delegated process invocations.
//!
//! gom never fetches or compiles anything itself. It builds an [`Invocation`]
//! for the Go toolchain (or for whatever command the user passed to
//! `gom exec`) and hands it to a [`CommandRunner`], which waits for it to
//! finish before the next step starts.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{GomError, Result};
use crate::vendor::VendorStore;

/// A command line plus the environment it runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, OsString)>,
    pub dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            dir: None,
        }
    }

    /// Splits `argv` into program and arguments.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv.split_first().ok_or(GomError::EmptyCommand)?;
        Ok(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, envs: Vec<(String, OsString)>) -> Self {
        self.envs.extend(envs);
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs delegated commands to completion.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<()>;
}

/// Spawns real processes with inherited stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        tracing::debug!(command = %invocation.command_line(), "spawning");
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        for (key, value) in &invocation.envs {
            cmd.env(key, value);
        }
        if let Some(dir) = &invocation.dir {
            cmd.current_dir(dir);
        }

        let status = cmd.status()?;
        if !status.success() {
            return Err(GomError::CommandFailed {
                command: invocation.command_line(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// `go get -d [args] <name>`: download without installing.
pub fn fetch(name: &str, args: &[String]) -> Invocation {
    Invocation::new("go")
        .args(["get", "-d"])
        .args(args.iter().cloned())
        .arg(name)
}

/// `go install` for a dependency.
///
/// Non-flag arguments name packages to build instead of the dependency
/// itself and are widened to `<pkg>/...`.
pub fn install(name: &str, args: &[String]) -> Invocation {
    let mut has_pkg = false;
    let args: Vec<String> = args
        .iter()
        .map(|arg| {
            if arg.starts_with('-') {
                arg.clone()
            } else {
                has_pkg = true;
                format!("{}/...", arg.trim_end_matches('/'))
            }
        })
        .collect();

    let invocation = Invocation::new("go").arg("install").args(args);
    if has_pkg {
        invocation
    } else {
        invocation.arg(name)
    }
}

/// Environment for fetching into and installing from the vendor tree.
pub fn install_env(vendor: &VendorStore) -> Vec<(String, OsString)> {
    vec![
        ("GOPATH".to_string(), vendor.root().as_os_str().to_owned()),
        ("GOBIN".to_string(), vendor.bin_dir().into_os_string()),
    ]
}

/// Environment for building the project against the vendor tree.
pub fn project_env(vendor: &VendorStore, project_dir: &Path) -> Result<Vec<(String, OsString)>> {
    Ok(vec![
        (
            "GOPATH".to_string(),
            vendor.project_gopath(project_dir, std::env::var_os("GOPATH"))?,
        ),
        (
            "PATH".to_string(),
            vendor.search_path(std::env::var_os("PATH"))?,
        ),
    ])
}
