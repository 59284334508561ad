//! Gate configuration from `preflight.toml`.
//!
//! The file is optional; every key falls back to the workflow's standard
//! toolchain (pnpm + prettier + rulebook). Rule texts are not configurable.

use crate::core::changes::DEFAULT_FORMATTER_EXTENSIONS;
use crate::core::error::PreflightError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "preflight.toml";
pub const CONFIG_DIR: &str = ".preflight";

/// An external program plus its leading arguments.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CommandDef {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandDef {
    pub fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Full argv: command, configured args, then `extra`.
    pub fn argv(&self, extra: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.args.len() + extra.len());
        argv.push(self.command.clone());
        argv.extend(self.args.iter().cloned());
        argv.extend(extra.iter().cloned());
        argv
    }
}

/// A named unconditional check (typecheck, lint, ...).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CheckDef {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CheckDef {
    fn pnpm(name: &str, script: &str) -> Self {
        Self {
            name: name.to_string(),
            command: "pnpm".to_string(),
            args: vec![script.to_string()],
        }
    }

    pub fn as_command(&self) -> CommandDef {
        CommandDef {
            command: self.command.clone(),
            args: self.args.clone(),
        }
    }
}

fn default_base_ref() -> String {
    "origin/main".to_string()
}

fn default_formatter_extensions() -> Vec<String> {
    DEFAULT_FORMATTER_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn default_formatter() -> CommandDef {
    CommandDef::new("pnpm", &["exec", "prettier", "--check"])
}

fn default_registry() -> CommandDef {
    CommandDef::new("rulebook", &["task", "validate"])
}

fn default_checks() -> Vec<CheckDef> {
    vec![
        CheckDef::pnpm("typecheck", "typecheck"),
        CheckDef::pnpm("lint", "lint"),
        CheckDef::pnpm("contract", "contract:check"),
        CheckDef::pnpm("unit", "test:unit"),
    ]
}

/// The preflight.toml structure
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PreflightConfig {
    /// Remote ref the branch diff is taken against.
    #[serde(default = "default_base_ref")]
    pub base_ref: String,
    #[serde(default = "default_formatter_extensions")]
    pub formatter_extensions: Vec<String>,
    /// Changed formatter targets are appended to this command.
    #[serde(default = "default_formatter")]
    pub formatter: CommandDef,
    /// The task id is appended to this command.
    #[serde(default = "default_registry")]
    pub registry: CommandDef,
    #[serde(default = "default_checks", rename = "check")]
    pub checks: Vec<CheckDef>,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            base_ref: default_base_ref(),
            formatter_extensions: default_formatter_extensions(),
            formatter: default_formatter(),
            registry: default_registry(),
            checks: default_checks(),
        }
    }
}

impl PreflightConfig {
    pub fn parse(content: &str) -> Result<Self, PreflightError> {
        let config: PreflightConfig =
            toml::from_str(content).map_err(|e| PreflightError::ConfigError(e.to_string()))?;
        if config.base_ref.trim().is_empty() {
            return Err(PreflightError::ConfigError("base_ref must not be empty".into()));
        }
        if config.formatter.command.trim().is_empty() || config.registry.command.trim().is_empty()
        {
            return Err(PreflightError::ConfigError("command must not be empty".into()));
        }
        if let Some(check) = config.checks.iter().find(|c| c.command.trim().is_empty()) {
            return Err(PreflightError::ConfigError(format!(
                "check '{}' has an empty command",
                check.name
            )));
        }
        Ok(config)
    }
}

/// Candidate config locations, in lookup order.
pub fn config_paths(repo_root: &Path) -> [PathBuf; 2] {
    [
        repo_root.join(CONFIG_FILE),
        repo_root.join(CONFIG_DIR).join(CONFIG_FILE),
    ]
}

/// Load config from the repository root; no file means defaults.
pub fn load_config(repo_root: &Path) -> Result<PreflightConfig, PreflightError> {
    for path in config_paths(repo_root) {
        if path.is_file() {
            let content = fs::read_to_string(&path).map_err(PreflightError::IoError)?;
            return PreflightConfig::parse(&content).map_err(|e| match e {
                PreflightError::ConfigError(msg) => {
                    PreflightError::ConfigError(format!("{}: {}", path.display(), msg))
                }
                other => other,
            });
        }
    }
    Ok(PreflightConfig::default())
}
