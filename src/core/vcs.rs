//! Version-control queries: repository root, current branch, changed files.

use crate::core::changes::ChangedFileSet;
use crate::core::collaborator::{CommandRunner, ProcessRunner};
use crate::core::error::PreflightError;
use crate::core::repo::RepositoryContext;
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait VersionControl {
    fn current_branch(&mut self, ctx: &RepositoryContext) -> Result<String, PreflightError>;

    /// Union of committed, local, and untracked changes relative to `base_ref`.
    fn changed_files(
        &mut self,
        ctx: &RepositoryContext,
        base_ref: &str,
    ) -> Result<ChangedFileSet, PreflightError>;
}

/// The three listings unioned into the changed-file set.
pub fn changed_file_queries(base_ref: &str) -> [Vec<String>; 3] {
    let to_argv = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();
    let range = format!("{}...HEAD", base_ref);
    [
        to_argv(&[
            "git",
            "diff",
            "--name-only",
            "--diff-filter=ACMR",
            range.as_str(),
        ]),
        to_argv(&["git", "diff", "--name-only", "--diff-filter=ACMR"]),
        to_argv(&["git", "ls-files", "--others", "--exclude-standard"]),
    ]
}

/// `git` through a [`CommandRunner`].
#[derive(Debug, Default)]
pub struct GitCli<R: CommandRunner = ProcessRunner> {
    runner: R,
}

impl<R: CommandRunner> GitCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Trimmed stdout of `git <args>`. A non-zero exit becomes `failure`;
    /// runner errors (git missing, spawn failure) pass through as they are.
    fn git(&mut self, args: &[&str], cwd: &Path, failure: &str) -> Result<String, PreflightError> {
        let mut argv = vec!["git".to_string()];
        argv.extend(args.iter().map(|a| a.to_string()));
        let output = self.runner.run(&argv, cwd)?;
        if !output.success() {
            eprintln!("{}", output.out.trim_end());
            return Err(PreflightError::CollaboratorFailure(format!(
                "{} (git {} exited {})",
                failure,
                args.join(" "),
                output.code
            )));
        }
        Ok(output.out.trim().to_string())
    }

    /// Top-level directory of the repository containing `start`.
    pub fn discover_root(&mut self, start: &Path) -> Result<PathBuf, PreflightError> {
        self.git(&["rev-parse", "--show-toplevel"], start, "not a git repository")
            .map(PathBuf::from)
    }
}

impl<R: CommandRunner> VersionControl for GitCli<R> {
    fn current_branch(&mut self, ctx: &RepositoryContext) -> Result<String, PreflightError> {
        self.git(
            &["rev-parse", "--abbrev-ref", "HEAD"],
            ctx.root(),
            "failed to get current branch",
        )
    }

    fn changed_files(
        &mut self,
        ctx: &RepositoryContext,
        base_ref: &str,
    ) -> Result<ChangedFileSet, PreflightError> {
        let mut changed = ChangedFileSet::default();
        for argv in changed_file_queries(base_ref) {
            let output = self.runner.run(&argv, ctx.root())?;
            if !output.success() {
                eprintln!("{}", output.out.trim_end());
                return Err(PreflightError::CollaboratorFailure(format!(
                    "failed to list changed files: {}",
                    argv.join(" ")
                )));
            }
            changed.extend_listing(&output.out);
        }
        debug!(count = changed.len(), base_ref, "collected changed files");
        Ok(changed)
    }
}
