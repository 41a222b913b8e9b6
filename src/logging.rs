// src/logging.rs

//! `tracing` subscriber setup for the `buildc` binary.
//!
//! The filter comes from `--log-level` when given, otherwise from the
//! `BUILDC_LOG` environment variable (full `EnvFilter` syntax, e.g.
//! `buildc::exec=debug,info`), otherwise `info`. Output goes to stderr;
//! stdout carries job output and the build report.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "BUILDC_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}

/// Filter for the given CLI level, falling back to `BUILDC_LOG`.
pub fn build_filter(cli_level: Option<LogLevel>) -> Result<EnvFilter> {
    match cli_level {
        Some(level) => Ok(EnvFilter::new(level.as_str())),
        None => match std::env::var(LOG_ENV_VAR) {
            Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
                .map_err(|e| anyhow::anyhow!("invalid {LOG_ENV_VAR} value '{directives}': {e}")),
            _ => Ok(EnvFilter::new("info")),
        },
    }
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
