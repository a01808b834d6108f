// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Step-level failures (spawn errors, failed builds, crashed services) are
//! reported through these variants, but the engine never lets them escape
//! the event loop: they cancel the owning generation and get logged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelaunchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("failed to spawn `{command}`: {source}")]
    SpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed ({status})")]
    StepFailed { command: String, status: String },

    #[error("`{command}` exited unexpectedly ({status})")]
    RuntimeExit { command: String, status: String },

    #[error("failed to kill process tree {pid}: {source}")]
    KillError {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("file watch error: {0}")]
    WatchError(String),

    #[error("generation cancelled before it finished starting")]
    GenerationCancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RelaunchError {
    /// True for the failures that only affect a single generation.
    ///
    /// The engine logs these and keeps watching.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            RelaunchError::SpawnError { .. }
                | RelaunchError::StepFailed { .. }
                | RelaunchError::RuntimeExit { .. }
                | RelaunchError::GenerationCancelled
        )
    }
}

impl From<notify::Error> for RelaunchError {
    fn from(err: notify::Error) -> Self {
        RelaunchError::WatchError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelaunchError>;
