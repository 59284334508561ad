//! Changed-file set and the classifications that drive later checks.

use crate::core::repo::{CHANGES_ARCHIVE_PREFIX, CHANGES_DIR};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static CHANGE_TASKS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^openspec/changes/[^/]+/tasks\.md$").expect("static regex")
});

/// Formatter extensions used when no configuration overrides them.
pub const DEFAULT_FORMATTER_EXTENSIONS: [&str; 11] = [
    ".cjs", ".css", ".html", ".js", ".json", ".md", ".mjs", ".ts", ".tsx", ".yaml", ".yml",
];

/// Repository-relative paths touched by this submission.
///
/// Paths are opaque strings: only surrounding whitespace is trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFileSet {
    paths: BTreeSet<String>,
}

impl ChangedFileSet {
    /// Union newline-separated listings (committed diff, local diff, untracked).
    pub fn from_listings<'a, I>(listings: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = Self::default();
        for listing in listings {
            set.extend_listing(listing);
        }
        set
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for p in paths {
            set.insert(p.as_ref());
        }
        set
    }

    pub fn extend_listing(&mut self, listing: &str) {
        for line in listing.lines() {
            self.insert(line);
        }
    }

    fn insert(&mut self, path: &str) {
        let path = path.trim();
        if !path.is_empty() {
            self.paths.insert(path.to_string());
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Active change task lists: `openspec/changes/<name>/tasks.md`, archive excluded.
    pub fn change_task_documents(&self) -> Vec<String> {
        self.iter()
            .filter(|p| CHANGE_TASKS_PATTERN.is_match(p) && !p.starts_with(CHANGES_ARCHIVE_PREFIX))
            .map(str::to_string)
            .collect()
    }

    /// Sorted paths the formatter should check.
    pub fn formatter_targets<S: AsRef<str>>(&self, extensions: &[S]) -> Vec<String> {
        self.iter()
            .filter(|p| extensions.iter().any(|ext| p.ends_with(ext.as_ref())))
            .map(str::to_string)
            .collect()
    }

    /// Whether any path lies inside one of the given active change directories.
    pub fn touches_active_change<S: AsRef<str>>(&self, active_changes: &[S]) -> bool {
        let prefixes: Vec<String> = active_changes
            .iter()
            .map(|name| format!("{}/{}/", CHANGES_DIR, name.as_ref()))
            .collect();
        self.iter()
            .any(|path| prefixes.iter().any(|prefix| path.starts_with(prefix)))
    }
}
