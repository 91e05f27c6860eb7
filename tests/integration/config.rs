//! Configuration discovery, overrides and error reporting.

use crate::common::TestProject;
use anyhow::Result;
use apichain_cli::grammar::PrimitiveType;
use apichain_cli::test_utils::{ConfigFixture, RequestFixture};

fn session_requests() -> Vec<RequestFixture> {
    vec![
        RequestFixture::post("/sessions").response_header("sessionId"),
        RequestFixture::get("/reports").header("sessionId", PrimitiveType::String),
    ]
}

#[test]
fn test_config_in_working_directory_is_used() -> Result<()> {
    let project = TestProject::new()?;
    project.write_requests(session_requests())?;

    // Headers are not resolved by default.
    project
        .run_apichain(&["resolve", "-i", "requests.json"])?
        .assert_success()
        .assert_stdout_contains("Resolved 0/0 consumers");

    ConfigFixture::permissive().write_to(project.project_path())?;
    project
        .run_apichain(&["resolve", "-i", "requests.json"])?
        .assert_success()
        .assert_stdout_contains("/1 consumers");

    let consumers = project.read_output("consumers.json")?;
    assert_eq!(consumers[0]["kind"], "header");
    Ok(())
}

#[test]
fn test_explicit_config_path() -> Result<()> {
    let project = TestProject::new()?;
    project.write_requests(session_requests())?;
    let config_dir = project.project_path().join("conf");
    std::fs::create_dir_all(&config_dir)?;
    let config = ConfigFixture::permissive().write_to(&config_dir)?;

    project
        .run_apichain(&["--config", &config.display().to_string(), "resolve", "-i", "requests.json"])?
        .assert_success()
        .assert_stdout_contains("/1 consumers");
    Ok(())
}

#[test]
fn test_config_dictionary_is_relative_to_config_file() -> Result<()> {
    let project = TestProject::new()?;
    let config_dir = project.project_path().join("conf");
    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(
        config_dir.join("dict.json"),
        r#"{ "restler_custom_payload": { "storeId": ["store-1"] } }"#,
    )?;
    std::fs::write(config_dir.join("apichain.toml"), "dictionary = \"dict.json\"\n")?;
    project.write_requests(vec![
        RequestFixture::post("/stores").response_fields(&[("id", PrimitiveType::String)]),
        RequestFixture::get("/stores/{storeId}"),
    ])?;

    project
        .run_apichain(&["-c", "conf/apichain.toml", "resolve", "-i", "requests.json"])?
        .assert_success()
        .assert_stdout_contains("dictionary: 1");
    Ok(())
}

#[test]
fn test_missing_config_file() -> Result<()> {
    let project = TestProject::new()?;
    project.write_requests(session_requests())?;

    project
        .run_apichain(&["--config", "absent.toml", "resolve", "-i", "requests.json"])?
        .assert_failure()
        .assert_stderr_contains("Configuration file not found");
    Ok(())
}

#[test]
fn test_invalid_config_syntax() -> Result<()> {
    let project = TestProject::new()?;
    project.write_requests(session_requests())?;
    ConfigFixture::invalid_syntax().write_to(project.project_path())?;

    project.run_apichain(&["resolve", "-i", "requests.json"])?.assert_failure();
    Ok(())
}

#[test]
fn test_unknown_config_field() -> Result<()> {
    let project = TestProject::new()?;
    project.write_requests(session_requests())?;
    ConfigFixture::unknown_field().write_to(project.project_path())?;

    project
        .run_apichain(&["resolve", "-i", "requests.json"])?
        .assert_failure()
        .assert_stderr_contains("resolve_everything");
    Ok(())
}

#[test]
fn test_conflicting_per_endpoint_dictionaries() -> Result<()> {
    let project = TestProject::new()?;
    project.write_requests(session_requests())?;
    project.write_file("a.json", r#"{ "restler_fuzzable_string": ["a"] }"#)?;
    project.write_file("b.json", r#"{ "restler_fuzzable_string": ["b"] }"#)?;
    project.write_config(
        r#"
[[per_endpoint_dictionaries]]
endpoints = ["/reports"]
dictionary = "a.json"

[[per_endpoint_dictionaries]]
endpoints = ["/reports/"]
dictionary = "b.json"
"#,
    )?;

    project
        .run_apichain(&["resolve", "-i", "requests.json"])?
        .assert_failure()
        .assert_stderr_contains("Conflicting dictionaries declared for endpoint /reports");
    Ok(())
}
