//! Branch contract: every gated branch is `task/<N>-<slug>`.

use crate::core::error::PreflightError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static BRANCH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^task/(?P<n>[0-9]+)-(?P<slug>[a-z0-9-]+)$").expect("static regex")
});

/// Task identity parsed from the branch name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    /// Issue number digits exactly as they appear in the branch.
    number: String,
    pub task_number: u64,
    pub slug: String,
}

impl BranchRef {
    /// Issue number as written in the branch, used for file names.
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Rulebook task identifier: `issue-<N>-<slug>`.
    pub fn task_id(&self) -> TaskId {
        TaskId(format!("issue-{}-{}", self.number, self.slug))
    }
}

/// Lookup key for rulebook task directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        TaskId(value.to_string())
    }
}

fn contract_violation(branch: &str) -> PreflightError {
    PreflightError::ContractViolation(format!(
        "[CONTRACT] branch must be task/<N>-<slug>, got: {}",
        branch
    ))
}

/// Parse a branch name into a [`BranchRef`].
///
/// The whole name must match; a zero or overflowing task number is rejected
/// the same way as a malformed shape.
pub fn parse_branch(branch: &str) -> Result<BranchRef, PreflightError> {
    let caps = BRANCH_PATTERN
        .captures(branch)
        .ok_or_else(|| contract_violation(branch))?;

    let number = caps["n"].to_string();
    let task_number: u64 = number.parse().map_err(|_| contract_violation(branch))?;
    if task_number == 0 {
        return Err(contract_violation(branch));
    }

    Ok(BranchRef {
        number,
        task_number,
        slug: caps["slug"].to_string(),
    })
}
