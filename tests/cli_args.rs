// tests/cli_args.rs

use std::path::PathBuf;

use buildc::cli::{CliArgs, LogLevel, parse_define};
use buildc::logging::build_filter;
use buildc::types::CheckMethod;
use clap::Parser;

#[test]
fn defaults_build_everything_with_mtime_checks() {
    let args = CliArgs::try_parse_from(["buildc"]).unwrap();

    assert!(args.targets.is_empty());
    assert!(args.files.is_empty());
    assert_eq!(args.jobs, None);
    assert_eq!(args.check, CheckMethod::Mtime);
    assert!(args.defines.is_empty());
    assert!(!args.dry_run);
}

#[test]
fn full_command_line() {
    let args = CliArgs::try_parse_from([
        "buildc",
        "-f",
        "base.yaml",
        "--file",
        "extra.toml",
        "-j",
        "4",
        "--check",
        "force",
        "-D",
        "out=build",
        "--define",
        "flags=-O2 -g",
        "--timeout",
        "30",
        "--dry-run",
        "app",
        "docs",
    ])
    .unwrap();

    assert_eq!(args.targets, ["app", "docs"]);
    assert_eq!(
        args.files,
        [PathBuf::from("base.yaml"), PathBuf::from("extra.toml")]
    );
    assert_eq!(args.jobs, Some(4));
    assert_eq!(args.check, CheckMethod::Force);
    assert_eq!(
        args.defines,
        [
            ("out".to_string(), "build".to_string()),
            ("flags".to_string(), "-O2 -g".to_string()),
        ]
    );
    assert_eq!(args.timeout, Some(30));
    assert!(args.dry_run);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(CliArgs::try_parse_from(["buildc", "-j", "0"]).is_err());
    assert!(CliArgs::try_parse_from(["buildc", "--check", "hash"]).is_err());
    assert!(CliArgs::try_parse_from(["buildc", "-D", "novalue"]).is_err());
    assert!(CliArgs::try_parse_from(["buildc", "--log-level", "loud"]).is_err());
}

#[test]
fn define_splits_on_the_first_equals_sign() {
    assert_eq!(
        parse_define("url=http://host/?a=b").unwrap(),
        ("url".to_string(), "http://host/?a=b".to_string())
    );
    assert_eq!(parse_define(" key =").unwrap(), ("key".to_string(), String::new()));
    assert!(parse_define("=value").is_err());
    assert!(parse_define("plain").is_err());
}

#[test]
fn check_methods_parse_case_insensitively() {
    assert_eq!("MTIME".parse::<CheckMethod>(), Ok(CheckMethod::Mtime));
    assert_eq!(" ignore ".parse::<CheckMethod>(), Ok(CheckMethod::Ignore));
    assert!("sometimes".parse::<CheckMethod>().is_err());
}

#[test]
fn log_level_flag_becomes_the_filter() {
    let args = CliArgs::try_parse_from(["buildc", "--log-level", "debug"]).unwrap();
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));

    let filter = build_filter(args.log_level).unwrap();
    assert_eq!(filter.to_string(), "debug");
}
