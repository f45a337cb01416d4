//! Tests for config, classify and simulate subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_config() {
    match parse(&["requeue", "config"]) {
        CliCommand::Config => {}
        _ => panic!("expected Config"),
    }
}

#[test]
fn cli_parse_classify_status() {
    match parse(&["requeue", "classify", "--status", "503"]) {
        CliCommand::Classify { status, error } => {
            assert_eq!(status, Some(503));
            assert!(error.is_none());
        }
        _ => panic!("expected Classify"),
    }
}

#[test]
fn cli_parse_classify_error() {
    match parse(&["requeue", "classify", "--error", "ConnectionLost"]) {
        CliCommand::Classify { status, error } => {
            assert!(status.is_none());
            assert_eq!(error.as_deref(), Some("ConnectionLost"));
        }
        _ => panic!("expected Classify"),
    }
}

#[test]
fn cli_parse_classify_needs_a_target() {
    assert!(Cli::try_parse_from(["requeue", "classify"]).is_err());
}

#[test]
fn cli_parse_classify_rejects_both_targets() {
    assert!(Cli::try_parse_from([
        "requeue", "classify", "--status", "500", "--error", "Dns"
    ])
    .is_err());
}

#[test]
fn cli_parse_classify_rejects_bad_status() {
    assert!(Cli::try_parse_from(["requeue", "classify", "--status", "70000"]).is_err());
}

#[test]
fn cli_parse_simulate() {
    match parse(&["requeue", "simulate", "scenario.toml"]) {
        CliCommand::Simulate { path } => assert_eq!(path, Path::new("scenario.toml")),
        _ => panic!("expected Simulate"),
    }
}

#[test]
fn cli_parse_global_config_after_subcommand() {
    let cli = Cli::try_parse_from(["requeue", "simulate", "s.toml", "--config", "/tmp/r.toml"])
        .unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/r.toml")));
    assert!(matches!(cli.command, CliCommand::Simulate { .. }));
}
