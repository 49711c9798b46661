//! Gomfile parsing and discovery.
//!
//! A Gomfile is a small Ruby-flavoured DSL, one statement per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! gom 'github.com/mattn/go-runewidth', :tag => 'go1'
//! gom 'github.com/mattn/go-scan', :commit => 'ecb144fb1f28'
//! gom 'github.com/mattn/go-ole', :goos => ['windows']
//!
//! group :test, :development do
//!   gom 'github.com/mattn/go-sqlite3'
//! end
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::model::{DependencySpec, OptionValue};
use crate::error::{GomError, Result};

pub const MANIFEST_FILE: &str = "Gomfile";
pub const LOCK_FILE: &str = "Gomfile.lock";

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:'([^']*)'|"([^"]*)")"#).expect("quoted literal regex"));
static SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([A-Za-z_][A-Za-z0-9_]*)").expect("symbol regex"));
static KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([a-z][a-z0-9_]*)\s*=>").expect("option key regex"));
static GOM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^gom\s+(.*)$").expect("gom line regex"));
static GROUP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^group\s+(.*\S)\s+do$").expect("group line regex"));
static END_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^end$").expect("end regex"));

/// Finds the Gomfile in `start` or the closest ancestor that has one.
pub fn locate(start: &Path) -> Result<PathBuf> {
    let start = std::path::absolute(start)?;
    let mut dir = start.as_path();
    loop {
        let candidate = dir.join(MANIFEST_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "located manifest");
            return Ok(candidate);
        }
        match dir.parent() {
            Some(parent) if parent != dir => dir = parent,
            _ => break,
        }
    }
    Err(GomError::ManifestNotFound {
        file: MANIFEST_FILE,
        start,
    })
}

/// Parses the lock file beside `manifest` when there is one, else `manifest`.
pub fn load(manifest: &Path) -> Result<Vec<DependencySpec>> {
    let lock = manifest.with_file_name(LOCK_FILE);
    if lock.is_file() {
        tracing::debug!(path = %lock.display(), "using lock file");
        parse_file(&lock)
    } else {
        parse_file(manifest)
    }
}

pub fn parse_file(path: &Path) -> Result<Vec<DependencySpec>> {
    let text = fs::read_to_string(path)?;
    parse_str(&text, path)
}

/// Parses Gomfile text. `origin` is only used for error messages.
pub fn parse_str(text: &str, origin: &Path) -> Result<Vec<DependencySpec>> {
    let mut deps: Vec<DependencySpec> = Vec::new();
    let mut seen = HashSet::new();
    // (line the block opened on, its groups)
    let mut block: Option<(usize, Vec<OptionValue>)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let syntax_error = |message: String| GomError::ManifestParse {
            path: origin.to_path_buf(),
            line: line_no,
            message,
        };

        if let Some(caps) = GROUP_LINE.captures(line) {
            if block.is_some() {
                return Err(syntax_error("nested `group` blocks are not supported".into()));
            }
            let groups = parse_group_names(&caps[1]).map_err(syntax_error)?;
            block = Some((line_no, groups));
            continue;
        }

        if END_LINE.is_match(line) {
            if block.take().is_none() {
                return Err(syntax_error("`end` without a matching `group`".into()));
            }
            continue;
        }

        let Some(caps) = GOM_LINE.captures(line) else {
            return Err(syntax_error(format!("unrecognised statement `{}`", line)));
        };
        let mut dep = parse_entry(&caps[1]).map_err(syntax_error)?;
        if let Some((_, groups)) = &block {
            dep.options.group = Some(OptionValue::List(groups.clone()));
        }
        if !seen.insert(dep.name.clone()) {
            return Err(syntax_error(format!("duplicate dependency '{}'", dep.name)));
        }
        deps.push(dep);
    }

    if let Some((line, _)) = block {
        return Err(GomError::ManifestParse {
            path: origin.to_path_buf(),
            line,
            message: "`group` block is never closed with `end`".into(),
        });
    }

    tracing::debug!(count = deps.len(), origin = %origin.display(), "parsed manifest");
    Ok(deps)
}

/// Parses everything after the `gom` keyword: the name and its options.
fn parse_entry(input: &str) -> std::result::Result<DependencySpec, String> {
    let mut rest = input.trim_start();

    let (name, after) = take_quoted(rest).ok_or("dependency name must be a quoted string")?;
    validate_name(name)?;
    rest = after.trim_start();

    let mut dep = DependencySpec::new(name);
    while !rest.is_empty() {
        rest = rest
            .strip_prefix(',')
            .ok_or_else(|| format!("expected `,` before `{}`", rest))?
            .trim_start();

        let caps = KEY
            .captures(rest)
            .ok_or_else(|| format!("expected `:key => value`, found `{}`", rest))?;
        let key = caps[1].to_string();
        rest = rest[caps[0].len()..].trim_start();

        let (value, after) = take_value(rest)
            .ok_or_else(|| format!("unresolvable value for option :{}", key))?;
        if dep.options.insert(&key, value).is_some() {
            return Err(format!("option :{} given twice", key));
        }
        rest = after.trim_start();
    }
    Ok(dep)
}

fn validate_name(name: &str) -> std::result::Result<(), String> {
    if name.trim().is_empty() {
        return Err("dependency name is empty".into());
    }
    if name.starts_with('/') || name.split('/').any(|part| part == "..") {
        return Err(format!("dependency name '{}' escapes the vendor tree", name));
    }
    Ok(())
}

fn parse_group_names(input: &str) -> std::result::Result<Vec<OptionValue>, String> {
    input
        .split(',')
        .map(|part| {
            let part = part.trim();
            match take_scalar(part) {
                Some((name, "")) => Ok(name),
                _ => Err(format!("invalid group name `{}`", part)),
            }
        })
        .collect()
}

fn take_value(input: &str) -> Option<(OptionValue, &str)> {
    match input.strip_prefix('[') {
        Some(list) => take_list(list),
        None => take_scalar(input),
    }
}

fn take_scalar(input: &str) -> Option<(OptionValue, &str)> {
    if let Some((s, rest)) = take_quoted(input) {
        return Some((OptionValue::Str(s.to_string()), rest));
    }
    let caps = SYMBOL.captures(input)?;
    Some((OptionValue::Symbol(caps[1].to_string()), &input[caps[0].len()..]))
}

fn take_quoted(input: &str) -> Option<(&str, &str)> {
    let caps = QUOTED.captures(input)?;
    let inner = caps.get(1).or_else(|| caps.get(2))?.as_str();
    Some((inner, &input[caps[0].len()..]))
}

/// Parses list items after the opening `[` up to and including the `]`.
fn take_list(input: &str) -> Option<(OptionValue, &str)> {
    let mut items = Vec::new();
    let mut rest = input.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix(']') {
            return Some((OptionValue::List(items), after));
        }
        let (item, after) = take_scalar(rest)?;
        items.push(item);
        rest = after.trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
        } else if !rest.starts_with(']') {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<DependencySpec>> {
        parse_str(text, Path::new("Gomfile"))
    }

    fn parse_err_line(text: &str) -> usize {
        match parse(text) {
            Err(GomError::ManifestParse { line, .. }) => line,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_preserves_order() {
        let deps = parse(
            "gom 'github.com/z/last'\n\
             gom 'github.com/a/first'\n\
             gom 'github.com/m/middle'\n",
        )
        .unwrap();
        let names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["github.com/z/last", "github.com/a/first", "github.com/m/middle"]
        );
    }

    #[test]
    fn test_parse_options() {
        let deps = parse(
            r#"gom 'github.com/mattn/go-scan', :commit => "ecb144fb", :goos => ['linux', :darwin], :tag => 'v1', :skipdep => :true"#,
        )
        .unwrap();
        let dep = &deps[0];
        assert_eq!(dep.commit(), Some("ecb144fb"));
        assert_eq!(dep.goos(), Some(vec!["linux", "darwin"]));
        assert_eq!(dep.option("tag"), Some(&OptionValue::Str("v1".into())));
        assert_eq!(
            dep.option("skipdep"),
            Some(&OptionValue::Symbol("true".into()))
        );
    }

    #[test]
    fn test_parse_group_block() {
        let deps = parse(
            "# test only\n\
             gom 'github.com/a/always'\n\
             group :test, :development do\n\
               gom 'github.com/a/sqlite', :group => 'production'\n\
             end\n\
             gom 'github.com/a/after'\n",
        )
        .unwrap();
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].groups(), None);
        assert_eq!(deps[1].groups(), Some(vec!["test", "development"]));
        assert_eq!(deps[2].groups(), None);
    }

    #[test]
    fn test_parse_empty_list_and_trailing_comma() {
        let deps = parse("gom 'x', :goos => [], :group => ['a', 'b',]").unwrap();
        assert_eq!(deps[0].goos(), Some(vec![]));
        assert_eq!(deps[0].groups(), Some(vec!["a", "b"]));
    }

    #[test]
    fn test_parse_errors_report_line() {
        assert_eq!(parse_err_line("gom 'a'\nbogus line\n"), 2);
        assert_eq!(parse_err_line("gom 'a', :commit => abc\n"), 1);
        assert_eq!(parse_err_line("gom 'a', :commit => ['x'\n"), 1);
        assert_eq!(parse_err_line("gom 'a'\n\nend\n"), 3);
        assert_eq!(parse_err_line("group :test do\ngom 'a'\n"), 1);
        assert_eq!(parse_err_line("group :a do\ngroup :b do\n"), 2);
        assert_eq!(parse_err_line("gom 'a'\ngom 'a'\n"), 2);
        assert_eq!(parse_err_line("gom ''\n"), 1);
        assert_eq!(parse_err_line("gom '../escape'\n"), 1);
        assert_eq!(parse_err_line("gom 'a', :tag => 'x', :tag => 'y'\n"), 1);
    }

    #[test]
    fn test_locate_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "gom 'a'\n").unwrap();
        let nested = dir.path().join("cmd").join("tool");
        std::fs::create_dir_all(&nested).unwrap();

        let found = locate(&nested).unwrap();
        assert_eq!(found, dir.path().join(MANIFEST_FILE));
    }

    #[test]
    fn test_locate_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        // A directory named Gomfile is not a manifest.
        std::fs::create_dir(dir.path().join(MANIFEST_FILE)).unwrap();
        let err = locate(dir.path());
        // An ancestor of the temp dir could hold a real Gomfile; only assert
        // that the directory itself was never accepted.
        if let Ok(path) = err {
            assert_ne!(path, dir.path().join(MANIFEST_FILE));
        }
    }

    #[test]
    fn test_load_prefers_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join(MANIFEST_FILE);
        std::fs::write(&manifest, "gom 'a'\n").unwrap();
        assert_eq!(load(&manifest).unwrap()[0].commit(), None);

        std::fs::write(dir.path().join(LOCK_FILE), "gom 'a', :commit => 'abc'\n").unwrap();
        assert_eq!(load(&manifest).unwrap()[0].commit(), Some("abc"));
    }
}
