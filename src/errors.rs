// src/errors.rs

//! Crate-wide error types.
//!
//! [`BuildError`] covers everything that aborts a build before (or instead
//! of) producing a [`BuildResult`](crate::job::BuildResult). Per-job failures
//! are [`JobError`]s; they never escape the scheduler and end up as a unit's
//! failed status instead.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in dependency graph: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("Unknown function '{0}': no function with that name is registered")]
    UnknownFunction(String),

    #[error("Unknown target or stage: {0}")]
    UnknownTarget(String),

    #[error("Freshness check failed for {path:?}: {source}")]
    FreshnessCheck {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Executor error: {0}")]
    Executor(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildError {
    /// Whether this error describes a structural problem with the build
    /// description (as opposed to an IO or executor failure).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BuildError::ConfigError(_)
                | BuildError::DependencyCycle(_)
                | BuildError::UnknownFunction(_)
                | BuildError::UnknownTarget(_)
                | BuildError::TomlError(_)
                | BuildError::JsonError(_)
                | BuildError::YamlError(_)
        )
    }
}

/// Why a single job did not succeed.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("function '{0}' is not registered")]
    UnknownFunction(String),

    #[error("function '{name}' failed: {source:#}")]
    FunctionFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("function '{name}' panicked: {message}")]
    FunctionPanicked { name: String, message: String },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with status {code}")]
    ExitStatus { command: String, code: i32 },

    #[error("'{command}' timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildError>;
