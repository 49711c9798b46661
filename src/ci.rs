use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

pub const TRAVIS_FILE: &str = ".travis.yml";

const TRAVIS_CONTENT: &str = r#"language: go
go:
  - tip
before_install:
  - go get github.com/mattn/gom
script:
  - $HOME/gopath/bin/gom install
  - $HOME/gopath/bin/gom test
"#;

/// Writes `.travis.yml` into `project_dir`.
///
/// An existing file is left untouched; `Ok(None)` reports that case.
pub fn generate_travis_yml(project_dir: &Path) -> Result<Option<PathBuf>> {
    println!("{} Generating Travis CI configuration...", "⚙️".cyan());

    let path = project_dir.join(TRAVIS_FILE);
    if path.exists() {
        println!(
            "{} CI config already exists at {}",
            "!".yellow(),
            path.display()
        );
        return Ok(None);
    }

    fs::write(&path, TRAVIS_CONTENT)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{} Created {}", "✓".green(), path.display());
    Ok(Some(path))
}
