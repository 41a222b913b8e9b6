// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::CheckMethod;

/// Command-line arguments for `buildc`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildc",
    version,
    about = "Run build jobs in dependency or stage order, rebuilding only what is stale.",
    long_about = None
)]
pub struct CliArgs {
    /// Targets (graph builds) or stages (stage builds) to build.
    ///
    /// Default: everything.
    #[arg(value_name = "TARGETS")]
    pub targets: Vec<String>,

    /// Build file (YAML, JSON or TOML). Repeat to merge several files.
    ///
    /// Default: the first of buildc.yaml, buildc.yml, buildc.json,
    /// buildc.toml in the current directory.
    #[arg(short, long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Maximum number of jobs running at once.
    ///
    /// Default: available parallelism.
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub jobs: Option<u32>,

    /// How to decide whether a target is stale.
    #[arg(short, long, value_name = "METHOD", default_value = "mtime", value_parser = parse_check)]
    pub check: CheckMethod,

    /// Substitution value for `{KEY}` placeholders; overrides `strings`.
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,

    /// Per-job timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the build files, print the plan, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_check(s: &str) -> Result<CheckMethod, String> {
    s.parse()
}

/// Parse `KEY=VALUE`; the value may itself contain `=`.
pub fn parse_define(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
