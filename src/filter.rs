//! Environment and platform filtering of Gomfile entries.

use std::collections::BTreeSet;

use crate::manifest::DependencySpec;

pub const PRODUCTION: &str = "production";
pub const DEVELOPMENT: &str = "development";
pub const TEST: &str = "test";

/// The set of environment tags a run is active for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEnvironment {
    tags: BTreeSet<String>,
}

impl ActiveEnvironment {
    /// Builds the active set from the three named flags plus custom groups.
    /// With none of the flags set, `development` is active.
    pub fn new<I, S>(production: bool, development: bool, test: bool, custom: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let development = development || !(production || test);
        let mut tags: BTreeSet<String> = [
            (production, PRODUCTION),
            (development, DEVELOPMENT),
            (test, TEST),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .map(|(_, tag)| tag.to_string())
        .collect();

        tags.extend(
            custom
                .into_iter()
                .map(|g| g.as_ref().trim().to_string())
                .filter(|g| !g.is_empty()),
        );
        Self { tags }
    }

    /// Splits a `--groups a,b` style list.
    pub fn with_group_list(production: bool, development: bool, test: bool, groups: &str) -> Self {
        Self::new(production, development, test, groups.split(','))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl Default for ActiveEnvironment {
    fn default() -> Self {
        Self::new(false, false, false, std::iter::empty::<&str>())
    }
}

/// True when no group is declared or any declared group is active.
pub fn match_env(declared: Option<&[&str]>, active: &ActiveEnvironment) -> bool {
    match declared {
        None => true,
        Some(groups) => groups.iter().any(|g| active.contains(g)),
    }
}

/// True when no platform is declared or one of them is `platform`.
pub fn match_os(declared: Option<&[&str]>, platform: &str) -> bool {
    match declared {
        None => true,
        Some(targets) => targets.contains(&platform),
    }
}

/// The running OS spelled the way Go's `GOOS` spells it.
pub fn current_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Keeps the entries that apply to `active` on `platform`, in manifest order.
pub fn filter<'a>(
    deps: &'a [DependencySpec],
    active: &ActiveEnvironment,
    platform: &str,
) -> Vec<&'a DependencySpec> {
    deps.iter()
        .filter(|dep| {
            let keep = match_env(dep.groups().as_deref(), active)
                && match_os(dep.goos().as_deref(), platform);
            if !keep {
                tracing::debug!(name = %dep.name, "dependency excluded from working set");
            }
            keep
        })
        .collect()
}
