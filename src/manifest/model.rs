use std::collections::BTreeMap;

/// A single option value as written in a Gomfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// `'text'` or `"text"`
    Str(String),
    /// `:text`
    Symbol(String),
    /// `['a', :b]`; items keep their own quoting and are never lists
    List(Vec<OptionValue>),
}

impl OptionValue {
    /// The scalar text, or `None` for a list.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) | OptionValue::Symbol(s) => Some(s),
            OptionValue::List(_) => None,
        }
    }

    /// Every item of the value; a scalar is a one element list.
    pub fn items(&self) -> Vec<&str> {
        match self {
            OptionValue::Str(s) | OptionValue::Symbol(s) => vec![s.as_str()],
            OptionValue::List(items) => items.iter().filter_map(OptionValue::as_scalar).collect(),
        }
    }
}

/// Options attached to a `gom` line.
///
/// The keys the core interprets get their own fields. Everything else
/// (`branch`, `tag`, `source`, ...) is carried verbatim in `extra` so the
/// entry can be written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyOptions {
    pub commit: Option<OptionValue>,
    pub group: Option<OptionValue>,
    pub goos: Option<OptionValue>,
    pub extra: BTreeMap<String, OptionValue>,
}

impl DependencyOptions {
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        match key {
            "commit" => self.commit.as_ref(),
            "group" => self.group.as_ref(),
            "goos" => self.goos.as_ref(),
            _ => self.extra.get(key),
        }
    }

    /// Sets `key`, returning the previous value if there was one.
    pub fn insert(&mut self, key: &str, value: OptionValue) -> Option<OptionValue> {
        match key {
            "commit" => self.commit.replace(value),
            "group" => self.group.replace(value),
            "goos" => self.goos.replace(value),
            _ => self.extra.insert(key.to_string(), value),
        }
    }

    /// All options sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        let mut all: Vec<(&str, &OptionValue)> = self
            .extra
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        for (key, value) in [
            ("commit", &self.commit),
            ("group", &self.group),
            ("goos", &self.goos),
        ] {
            if let Some(v) = value {
                all.push((key, v));
            }
        }
        all.sort_by(|a, b| a.0.cmp(b.0));
        all.into_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.commit.is_none() && self.group.is_none() && self.goos.is_none() && self.extra.is_empty()
    }
}

/// One declared dependency of a Gomfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub options: DependencyOptions,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: DependencyOptions::default(),
        }
    }

    pub fn with_option(mut self, key: &str, value: OptionValue) -> Self {
        self.options.insert(key, value);
        self
    }

    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    /// The pinned revision. Lists and empty strings count as "no pin".
    pub fn commit(&self) -> Option<&str> {
        self.options
            .commit
            .as_ref()
            .and_then(OptionValue::as_scalar)
            .filter(|c| !c.is_empty())
    }

    pub fn set_commit(&mut self, revision: impl Into<String>) {
        self.options.commit = Some(OptionValue::Str(revision.into()));
    }

    /// Declared environment groups, or `None` when the entry applies everywhere.
    pub fn groups(&self) -> Option<Vec<&str>> {
        self.options.group.as_ref().map(OptionValue::items)
    }

    /// Declared target platforms, or `None` when the entry applies everywhere.
    pub fn goos(&self) -> Option<Vec<&str>> {
        self.options.goos.as_ref().map(OptionValue::items)
    }

    /// What `gom install` should check out: commit, then tag, then branch.
    pub fn checkout_target(&self) -> Option<&str> {
        self.commit().or_else(|| {
            ["tag", "branch"].into_iter().find_map(|key| {
                self.options
                    .extra
                    .get(key)
                    .and_then(OptionValue::as_scalar)
                    .filter(|v| !v.is_empty())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_ignores_lists_and_empty() {
        let dep = DependencySpec::new("github.com/a/b")
            .with_option("commit", OptionValue::List(vec![OptionValue::Str("abc".into())]));
        assert_eq!(dep.commit(), None);

        let dep = DependencySpec::new("github.com/a/b")
            .with_option("commit", OptionValue::Str(String::new()));
        assert_eq!(dep.commit(), None);

        let dep = DependencySpec::new("github.com/a/b")
            .with_option("commit", OptionValue::Str("abc123".into()));
        assert_eq!(dep.commit(), Some("abc123"));
    }

    #[test]
    fn test_groups_coerce_scalar() {
        let dep = DependencySpec::new("x").with_option("group", OptionValue::Symbol("test".into()));
        assert_eq!(dep.groups(), Some(vec!["test"]));
        assert_eq!(DependencySpec::new("x").groups(), None);
    }

    #[test]
    fn test_checkout_target_precedence() {
        let dep = DependencySpec::new("x")
            .with_option("branch", OptionValue::Str("master".into()))
            .with_option("tag", OptionValue::Str("v1".into()));
        assert_eq!(dep.checkout_target(), Some("v1"));

        let mut dep = dep;
        dep.set_commit("deadbeef");
        assert_eq!(dep.checkout_target(), Some("deadbeef"));
    }

    #[test]
    fn test_iter_is_sorted_across_fields() {
        let dep = DependencySpec::new("x")
            .with_option("tag", OptionValue::Str("v1".into()))
            .with_option("commit", OptionValue::Str("abc".into()))
            .with_option("goos", OptionValue::Str("linux".into()));
        let keys: Vec<&str> = dep.options.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["commit", "goos", "tag"]);
    }
}
