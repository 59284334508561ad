use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreflightError {
    /// Branch name does not follow `task/<N>-<slug>`.
    #[error("{0}")]
    ContractViolation(String),
    /// An expected file or directory is absent.
    #[error("{0}")]
    MissingArtifact(String),
    /// A governance document is missing or misorders required text.
    #[error("{0}")]
    StructuralViolation(String),
    /// Repository layout or submission contents disagree with each other.
    #[error("{0}")]
    ConsistencyViolation(String),
    /// An external command exited unsuccessfully.
    #[error("{0}")]
    CollaboratorFailure(String),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
