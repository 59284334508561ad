//! External command execution.
//!
//! Formatter, linter, type-checker, test runner, and task registry are all
//! reached through [`CommandRunner`]; each invocation blocks until the
//! program exits and has no timeout.

use crate::core::error::PreflightError;
use std::path::Path;
use std::process::Command;
use std::time::Instant;
use tracing::debug;

/// Combined result of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `-1` when terminated by a signal.
    pub code: i32,
    /// stdout followed by stderr.
    pub out: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

pub trait CommandRunner {
    /// Run `argv` in `cwd`; a non-zero exit is reported in the output, not as an error.
    fn run(&mut self, argv: &[String], cwd: &Path) -> Result<CommandOutput, PreflightError>;
}

/// Runs commands as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, argv: &[String], cwd: &Path) -> Result<CommandOutput, PreflightError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(PreflightError::CollaboratorFailure(
                "command failed: empty command".to_string(),
            ));
        };

        let start = Instant::now();
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| {
                PreflightError::CollaboratorFailure(format!(
                    "command failed: {} ({})",
                    argv.join(" "),
                    e
                ))
            })?;

        let code = output.status.code().unwrap_or(-1);
        debug!(
            cmd = %argv.join(" "),
            code,
            duration_ms = start.elapsed().as_millis() as u64,
            "command finished"
        );

        let mut out = String::from_utf8_lossy(&output.stdout).to_string();
        out.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CommandOutput { code, out })
    }
}

/// Run a command, echo it and its output, and fail on a non-zero exit.
pub fn must_run<R: CommandRunner + ?Sized>(
    runner: &mut R,
    argv: &[String],
    cwd: &Path,
) -> Result<CommandOutput, PreflightError> {
    let result = runner.run(argv, cwd)?;
    println!("$ {}", argv.join(" "));
    if !result.out.trim().is_empty() {
        println!("{}", result.out.trim_end());
    }
    if !result.success() {
        return Err(PreflightError::CollaboratorFailure(format!(
            "command failed: {} (exit {})",
            argv.join(" "),
            result.code
        )));
    }
    Ok(result)
}
