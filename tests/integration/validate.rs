//! Integration tests for `apichain validate`.

use anyhow::Result;
use apichain_cli::annotations::{AnnotationResource, ProducerConsumerAnnotation};
use apichain_cli::grammar::{
    OperationMethod, ParameterSerialization, PrimitiveType, RequestId, RequestParameter, SerializationStyle,
};
use apichain_cli::test_utils::RequestFixture;
use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::TestProject;

fn apichain(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("apichain").unwrap();
    cmd.current_dir(project.project_path()).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_validate_clean_input() -> Result<()> {
    let project = TestProject::new()?;
    project.write_requests(vec![
        RequestFixture::post("/stores").response_fields(&[("id", PrimitiveType::String)]),
        RequestFixture::get("/stores/{storeId}"),
    ])?;

    apichain(&project)
        .args(["validate", "-i", "requests.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 requests, 0 annotations"))
        .stdout(predicate::str::contains("Valid compilation input"));
    Ok(())
}

#[test]
fn test_validate_json_output() -> Result<()> {
    let project = TestProject::new()?;
    project.write_requests(vec![RequestFixture::get("/stores")])?;

    let output = apichain(&project)
        .args(["validate", "-i", "requests.json", "--format", "json"])
        .assert()
        .success();

    let results: serde_json::Value = serde_json::from_slice(&output.get_output().stdout)?;
    assert_eq!(results["valid"], true);
    assert_eq!(results["requests"], 1);
    assert_eq!(results["errors"], serde_json::json!([]));
    Ok(())
}

#[test]
fn test_validate_unknown_annotation_request() -> Result<()> {
    let project = TestProject::new()?;
    let archives = RequestId::new("/archives", OperationMethod::Post);
    project.write_requests(vec![RequestFixture::get("/stores/{storeId}").local_annotation(
        ProducerConsumerAnnotation::new(archives, AnnotationResource::Name("archiveKey".into())),
    )])?;

    apichain(&project)
        .args(["validate", "-i", "requests.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Annotation references unknown request POST /archives"));
    Ok(())
}

#[test]
fn test_validate_unsupported_serialization() -> Result<()> {
    let project = TestProject::new()?;
    let mut filter = RequestParameter::fuzzable("filter", PrimitiveType::Object);
    filter.serialization = Some(ParameterSerialization {
        style: SerializationStyle::DeepObject,
        explode: true,
    });
    project.write_requests(vec![RequestFixture::get("/search").query_param(filter)])?;

    apichain(&project)
        .args(["validate", "-i", "requests.json", "--format", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unsupported serialization style"));
    Ok(())
}

#[test]
fn test_validate_strict_fails_on_warnings() -> Result<()> {
    let project = TestProject::new()?;
    project.write_file("legacy.json", "{}")?;
    project.write_config(
        r#"
[[per_endpoint_dictionaries]]
endpoints = ["/legacy"]
dictionary = "legacy.json"
"#,
    )?;
    project.write_requests(vec![RequestFixture::get("/stores")])?;

    apichain(&project)
        .args(["validate", "-i", "requests.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Per-endpoint dictionary names unknown endpoint /legacy"));

    apichain(&project)
        .args(["validate", "-i", "requests.json", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Strict mode"));
    Ok(())
}

#[test]
fn test_validate_malformed_input() -> Result<()> {
    let project = TestProject::new()?;
    project.write_file("requests.json", "{ not json")?;

    apichain(&project)
        .args(["validate", "-i", "requests.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid compilation input"));
    Ok(())
}
