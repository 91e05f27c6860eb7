//! Tests for argument parsing, configuration building and command execution.
//!
//! Execution tests pass an explicit `--config` so the working directory is
//! never consulted, and write everything into temporary directories.

use crate::cli::{Cli, CliConfig, OutputFormat};
use crate::grammar::{PrimitiveType, Tree};
use crate::test_utils::{ConfigFixture, RequestFixture, compilation_input};
use crate::utils::write_json_file;
use clap::Parser;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("apichain").chain(args.iter().copied())).unwrap()
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn write_input(dir: &Path) -> PathBuf {
    let input = compilation_input([
        RequestFixture::post("/stores").response_fields(&[("id", PrimitiveType::String)]),
        RequestFixture::get("/stores/{storeId}"),
        RequestFixture::get("/stores").query("cursor", PrimitiveType::String),
    ]);
    let path = dir.join("requests.json");
    write_json_file(&path, &input).unwrap();
    path
}

#[test]
fn test_cli_parsing() {
    let cli = Cli::try_parse_from(["apichain", "--help"]);
    assert!(cli.is_err());

    let cli = Cli::try_parse_from(["apichain", "resolve", "--input", "requests.json"]);
    assert!(cli.is_ok());

    let cli = Cli::try_parse_from(["apichain", "resolve"]);
    assert!(cli.is_err(), "--input is required");
}

#[test]
fn test_cli_global_flags() {
    let cli = Cli::try_parse_from(["apichain", "-v", "validate", "-i", "in.json"]).unwrap();
    assert!(cli.verbose);

    let cli = Cli::try_parse_from(["apichain", "validate", "-i", "in.json", "--quiet"]).unwrap();
    assert!(cli.quiet);

    let cli = Cli::try_parse_from(["apichain", "--config", "/tmp/apichain.toml", "resolve", "-i", "x"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/apichain.toml")));

    let cli = Cli::try_parse_from(["apichain", "-v", "-q", "resolve", "-i", "x"]);
    assert!(cli.is_err(), "verbose and quiet conflict");
}

#[test]
fn test_validate_format_option() {
    let cli = Cli::try_parse_from(["apichain", "validate", "-i", "x", "--format", "json", "--strict"]).unwrap();
    match cli.command {
        super::Commands::Validate(cmd) => {
            assert_eq!(cmd.format, OutputFormat::Json);
            assert!(cmd.strict);
        }
        super::Commands::Resolve(_) => panic!("expected validate"),
    }

    let cli = Cli::try_parse_from(["apichain", "validate", "-i", "x", "--format", "yaml"]);
    assert!(cli.is_err());
}

#[test]
fn test_build_config_log_levels() {
    let cli = Cli::try_parse_from(["apichain", "resolve", "-i", "x"]).unwrap();
    assert_eq!(cli.build_config().log_level, Some("warn".to_string()));

    let cli = Cli::try_parse_from(["apichain", "--verbose", "resolve", "-i", "x"]).unwrap();
    assert_eq!(cli.build_config().log_level, Some("debug".to_string()));

    let cli = Cli::try_parse_from(["apichain", "--quiet", "resolve", "-i", "x"]).unwrap();
    let config = cli.build_config();
    assert_eq!(config.log_level, None);
    assert_eq!(config.config_path, None);
}

#[test]
fn test_resolve_writes_diagnostics() {
    let temp = TempDir::new().unwrap();
    let config = ConfigFixture::basic().write_to(temp.path()).unwrap();
    let input = write_input(temp.path());
    let out = temp.path().join("out");

    let cli = parse(&[
        "--quiet",
        "--config",
        &path_arg(&config),
        "resolve",
        "--input",
        &path_arg(&input),
        "--output-dir",
        &path_arg(&out),
    ]);
    let cli_config = cli.build_config();
    cli.execute_with_config(cli_config).unwrap();

    assert!(out.join(crate::constants::DEPENDENCIES_FILE).exists());
    assert!(out.join(crate::constants::UNRESOLVED_DEPENDENCIES_FILE).exists());
}

#[test]
fn test_validate_accepts_clean_input() {
    let temp = TempDir::new().unwrap();
    let config = ConfigFixture::basic().write_to(temp.path()).unwrap();
    let input = write_input(temp.path());

    let cli = parse(&["--quiet", "validate", "-i", &path_arg(&input)]);
    let cli_config = CliConfig {
        config_path: Some(config),
        ..CliConfig::new()
    };
    assert!(cli.execute_with_config(cli_config).is_ok());
}

#[test]
fn test_validate_rejects_array_path_parameter() {
    let temp = TempDir::new().unwrap();
    let config = ConfigFixture::basic().write_to(temp.path()).unwrap();
    let input = compilation_input([RequestFixture::get("/items/{ids}").path_param(
        crate::grammar::RequestParameter {
            name: "ids".to_string(),
            payload: Tree::array("ids", Tree::fuzzable_leaf("", PrimitiveType::String)),
            serialization: None,
        },
    )]);
    let input_path = temp.path().join("requests.json");
    write_json_file(&input_path, &input).unwrap();

    let cli = parse(&["--quiet", "validate", "-i", &path_arg(&input_path)]);
    let cli_config = CliConfig {
        config_path: Some(config),
        ..CliConfig::new()
    };
    let err = cli.execute_with_config(cli_config).unwrap_err();
    assert!(err.to_string().contains("ids"), "unexpected error: {err}");
}

#[test]
fn test_missing_input_fails() {
    let temp = TempDir::new().unwrap();
    let config = ConfigFixture::basic().write_to(temp.path()).unwrap();
    let missing = temp.path().join("missing.json");

    let cli = parse(&["--quiet", "resolve", "-i", &path_arg(&missing)]);
    let cli_config = CliConfig {
        config_path: Some(config),
        ..CliConfig::new()
    };
    let err = cli.execute_with_config(cli_config).unwrap_err();
    assert!(format!("{err:#}").contains("missing.json"));
}
