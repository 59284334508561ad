//! Pre-flight run: the fixed, fail-fast sequence of checks.
//!
//! Order:
//! 1. branch contract
//! 2. run log presence
//! 3. working tree status (echo only)
//! 4. rulebook task location, then registry validation for active tasks
//! 5. changed-file collection
//! 6. change task lists and execution order
//! 7. formatter over changed targets, then the configured checks
//!
//! The first failure stops the run; nothing after it executes.

use crate::core::branch::{self, BranchRef, TaskId};
use crate::core::changes::ChangedFileSet;
use crate::core::collaborator::{CommandRunner, must_run};
use crate::core::config::PreflightConfig;
use crate::core::error::PreflightError;
use crate::core::execution_order::{self, ExecutionOrderOutcome};
use crate::core::output;
use crate::core::repo::RepositoryContext;
use crate::core::rulebook::{self, TaskLocation};
use crate::core::tasks_doc::{self, ChangeTasksOutcome};
use crate::core::vcs::VersionControl;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Passed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
}

/// Record of a run that passed every check.
#[derive(Debug, Clone)]
pub struct PreflightReport {
    pub branch: BranchRef,
    pub task_id: TaskId,
    pub location: TaskLocation,
    pub changed_files: usize,
    pub steps: Vec<StepRecord>,
}

impl PreflightReport {
    pub fn step(&self, name: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.name == name)
    }
}

pub struct Preflight<'a, V: VersionControl, R: CommandRunner> {
    ctx: &'a RepositoryContext,
    config: &'a PreflightConfig,
    vcs: &'a mut V,
    runner: &'a mut R,
    steps: Vec<StepRecord>,
}

impl<'a, V: VersionControl, R: CommandRunner> Preflight<'a, V, R> {
    pub fn new(
        ctx: &'a RepositoryContext,
        config: &'a PreflightConfig,
        vcs: &'a mut V,
        runner: &'a mut R,
    ) -> Self {
        Self {
            ctx,
            config,
            vcs,
            runner,
            steps: Vec::new(),
        }
    }

    fn passed(&mut self, name: &str) {
        info!(step = name, "passed");
        self.steps.push(StepRecord {
            name: name.to_string(),
            status: StepStatus::Passed,
        });
    }

    fn skipped(&mut self, name: &str, reason: &str) {
        info!(step = name, reason, "skipped");
        output::skip(name, reason);
        self.steps.push(StepRecord {
            name: name.to_string(),
            status: StepStatus::Skipped,
        });
    }

    fn exec(&mut self, argv: &[String]) -> Result<(), PreflightError> {
        must_run(&mut *self.runner, argv, self.ctx.root())?;
        Ok(())
    }

    pub fn run(mut self) -> Result<PreflightReport, PreflightError> {
        let branch_name = self.vcs.current_branch(self.ctx)?;
        let branch = branch::parse_branch(&branch_name)?;
        self.passed("branch");

        let run_log = self.ctx.run_log(branch.number());
        if !run_log.is_file() {
            return Err(PreflightError::MissingArtifact(format!(
                "[RUN_LOG] required file missing: {}",
                run_log.display()
            )));
        }
        self.passed("run-log");

        output::section("Repo checks", true);
        self.exec(&["git", "status", "--porcelain=v1"].map(String::from))?;
        self.passed("git-status");

        output::section("Rulebook checks", false);
        let task_id = branch.task_id();
        let location = rulebook::resolve_task_location(self.ctx, &task_id)?;
        self.passed("rulebook-location");
        if location.needs_registry_validation() {
            let argv = self.config.registry.argv(&[task_id.to_string()]);
            self.exec(&argv)?;
            self.passed("rulebook-validate");
        } else {
            output::note(&format!(
                "task {} is archived at {}",
                task_id,
                location.path.display()
            ));
            self.skipped("rulebook-validate", "task already archived");
        }

        output::section("Workspace checks", false);
        let changed = self.vcs.changed_files(self.ctx, &self.config.base_ref)?;
        output::note(&format!("{} changed file(s)", changed.len()));
        self.passed("changed-files");

        output::section("OpenSpec change checks", false);
        self.check_change_documents(&changed)?;
        self.check_formatting(&changed)?;

        let config = self.config;
        for check in &config.checks {
            self.exec(&check.as_command().argv(&[]))?;
            self.passed(&check.name);
        }

        Ok(PreflightReport {
            branch,
            task_id,
            location,
            changed_files: changed.len(),
            steps: self.steps,
        })
    }

    fn check_change_documents(&mut self, changed: &ChangedFileSet) -> Result<(), PreflightError> {
        match tasks_doc::validate_change_tasks(self.ctx, changed)? {
            ChangeTasksOutcome::Skipped => self.skipped(
                "openspec change tasks TDD-structure check",
                "no changed openspec/changes/*/tasks.md",
            ),
            ChangeTasksOutcome::Checked(docs) => {
                output::note(&format!("{} change task list(s) checked", docs.len()));
                self.passed("openspec change tasks TDD-structure check");
            }
        }

        match execution_order::validate_execution_order(self.ctx, changed)? {
            ExecutionOrderOutcome::Skipped { .. } => {
                self.skipped("execution order check", "active changes < 2")
            }
            ExecutionOrderOutcome::Checked { .. } => self.passed("execution order check"),
        }
        Ok(())
    }

    fn check_formatting(&mut self, changed: &ChangedFileSet) -> Result<(), PreflightError> {
        let targets = changed.formatter_targets(&self.config.formatter_extensions);
        if targets.is_empty() {
            self.skipped("formatter", "no changed targets");
            return Ok(());
        }
        let argv = self.config.formatter.argv(&targets);
        self.exec(&argv)?;
        self.passed("formatter");
        Ok(())
    }
}

/// Run the whole gate against `ctx`.
pub fn run_preflight<V: VersionControl, R: CommandRunner>(
    ctx: &RepositoryContext,
    config: &PreflightConfig,
    vcs: &mut V,
    runner: &mut R,
) -> Result<PreflightReport, PreflightError> {
    Preflight::new(ctx, config, vcs, runner).run()
}
