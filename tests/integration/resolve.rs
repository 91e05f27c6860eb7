//! Resolution scenarios driven through `apichain resolve`.

use crate::common::{FileAssert, TestProject};
use anyhow::Result;
use apichain_cli::grammar::{PrimitiveType, Tree};
use apichain_cli::test_utils::RequestFixture;
use serde_json::{Value, json};

fn request(endpoint: &str, method: &str) -> Value {
    json!({ "endpoint": endpoint, "method": method })
}

/// Entries of `dependencies.json` whose consumer belongs to `endpoint`/`method`.
fn dependencies_of<'a>(dependencies: &'a Value, key: &str, endpoint: &str, method: &str) -> Vec<&'a Value> {
    dependencies[key]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter(|d| d["consumer"]["resource"]["request_id"] == request(endpoint, method))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_post_response_feeds_path_parameter() -> Result<()> {
    let project = TestProject::new()?;
    let input = project.write_requests(vec![
        RequestFixture::post("/stores").response_fields(&[("id", PrimitiveType::String)]),
        RequestFixture::get("/stores/{storeId}"),
    ])?;

    project
        .run_apichain(&["resolve", "--input", &input.display().to_string()])?
        .assert_success()
        .assert_stdout_contains("Resolved 1/1 consumers")
        .assert_stdout_contains("exact_type: 1");

    let dependencies = project.read_output("dependencies.json")?;
    let entries = dependencies_of(&dependencies, "storeId", "/stores/{storeId}", "GET");
    assert_eq!(entries.len(), 1);
    let producer = &entries[0]["producer"];
    assert_eq!(producer["producer"], "response");
    assert_eq!(producer["resource"]["request_id"], request("/stores", "POST"));
    assert_eq!(producer["resource"]["producer_parameter_name"], "id");

    assert_eq!(project.read_output("unresolved_dependencies.json")?, json!([]));
    Ok(())
}

#[test]
fn test_put_self_reference_gets_uuid_suffix() -> Result<()> {
    let project = TestProject::new()?;
    let input = project.write_requests(vec![
        RequestFixture::put("/stores/{storeId}").response_fields(&[("id", PrimitiveType::String)]),
        RequestFixture::get("/stores/{storeId}"),
    ])?;

    project
        .run_apichain(&["resolve", "-i", &input.display().to_string()])?
        .assert_success()
        .assert_stdout_contains("Resolved 2/2 consumers");

    let dictionary = project.read_output("dict.json")?;
    assert_eq!(dictionary["restler_custom_payload_uuid4_suffix"]["storeId"], "storeid");

    let dependencies = project.read_output("dependencies.json")?;
    let reader = dependencies_of(&dependencies, "storeId", "/stores/{storeId}", "GET");
    assert_eq!(reader[0]["producer"]["producer"], "input_only");
    assert_eq!(reader[0]["producer"]["origin"], "writer");

    let ordering = project.read_output("ordering_constraints.json")?;
    assert!(
        ordering
            .as_array()
            .is_some_and(|constraints| constraints.contains(&json!({
                "source": request("/stores/{storeId}", "PUT"),
                "target": request("/stores/{storeId}", "GET"),
            }))),
        "missing PUT -> GET ordering: {ordering}"
    );
    Ok(())
}

#[test]
fn test_ambiguous_nested_match_stays_unresolved() -> Result<()> {
    let item = |endpoint: &str| {
        RequestFixture::post(endpoint).response(Tree::object(
            "",
            vec![Tree::object("item", vec![Tree::fuzzable_leaf("id", PrimitiveType::String)])],
        ))
    };
    let order = RequestFixture::post("/orders").body(Tree::object(
        "",
        vec![Tree::array(
            "lineItems",
            Tree::object("", vec![Tree::fuzzable_leaf("id", PrimitiveType::String)]),
        )],
    ));

    let project = TestProject::new()?;
    let input = project.write_requests(vec![item("/widgets"), item("/gadgets"), order])?;

    project
        .run_apichain(&["resolve", "-i", &input.display().to_string()])?
        .assert_success()
        .assert_stdout_contains("1 ambiguous matches left unresolved");

    let unresolved = project.read_output("unresolved_dependencies.json")?;
    let unresolved = unresolved.as_array().cloned().unwrap_or_default();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0]["consumer"]["resource"]["request_id"], request("/orders", "POST"));
    assert_eq!(unresolved[0]["producer"], Value::Null);
    Ok(())
}

#[test]
fn test_same_body_alias_and_cycle_guard() -> Result<()> {
    let project = TestProject::new()?;
    project.write_config("[same_body.aliases]\nid = \"parent\"\n")?;
    let input = project.write_requests(vec![
        RequestFixture::post("/folders").body(Tree::object(
            "",
            vec![Tree::object("parent", vec![Tree::fuzzable_leaf("id", PrimitiveType::String)])],
        )),
        RequestFixture::post("/labels").body_fields(&[
            ("id", PrimitiveType::String),
            ("parent", PrimitiveType::String),
        ]),
    ])?;

    project.run_apichain(&["resolve", "-i", &input.display().to_string()])?.assert_success();

    let dependencies = project.read_output("dependencies.json")?;
    let nested = dependencies_of(&dependencies, "/parent/id", "/folders", "POST");
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0]["producer"], Value::Null, "a property never feeds from its ancestor");

    let sibling = dependencies_of(&dependencies, "/id", "/labels", "POST");
    assert_eq!(sibling[0]["producer"]["producer"], "same_body");
    assert_eq!(sibling[0]["producer"]["resource"]["producer_parameter_name"], "parent");
    Ok(())
}

#[test]
fn test_dictionary_entry_takes_precedence() -> Result<()> {
    let project = TestProject::new()?;
    project.write_file(
        "dict.json",
        r#"{ "restler_custom_payload": { "storeId": ["store-1"] } }"#,
    )?;
    let input = project.write_requests(vec![
        RequestFixture::post("/stores").response_fields(&[("id", PrimitiveType::String)]),
        RequestFixture::get("/stores/{storeId}"),
    ])?;

    project
        .run_apichain(&["resolve", "-i", &input.display().to_string(), "--dictionary", "dict.json"])?
        .assert_success();

    let dependencies = project.read_output("dependencies.json")?;
    let entries = dependencies_of(&dependencies, "storeId", "/stores/{storeId}", "GET");
    assert_eq!(entries[0]["producer"]["producer"], "dictionary");
    assert_eq!(entries[0]["producer"]["payload"]["name"], "storeId");

    let dictionary = project.read_output("dict.json")?;
    assert_eq!(dictionary["restler_custom_payload"]["storeId"], json!(["store-1"]));
    Ok(())
}

#[test]
fn test_global_annotation_file() -> Result<()> {
    let project = TestProject::new()?;
    project.write_file(
        "annotations.json",
        r#"{
  "x-restler-global-annotations": [
    {
      "producer_endpoint": "/archives",
      "producer_method": "POST",
      "producer_resource_name": "archiveKey",
      "consumer_param": "storeId"
    }
  ]
}"#,
    )?;
    let input = project.write_requests(vec![
        RequestFixture::post("/stores").response_fields(&[("id", PrimitiveType::String)]),
        RequestFixture::post("/archives").response_fields(&[("archiveKey", PrimitiveType::String)]),
        RequestFixture::get("/stores/{storeId}"),
    ])?;

    project
        .run_apichain(&["resolve", "-i", &input.display().to_string(), "--annotations", "annotations.json"])?
        .assert_success()
        .assert_stdout_contains("annotation: 1");

    let dependencies = project.read_output("dependencies.json")?;
    let entries = dependencies_of(&dependencies, "storeId", "/stores/{storeId}", "GET");
    assert_eq!(entries[0]["producer"]["resource"]["request_id"], request("/archives", "POST"));
    Ok(())
}

#[test]
fn test_custom_output_dir_receives_all_files() -> Result<()> {
    let project = TestProject::new()?;
    let input = project.write_requests(vec![RequestFixture::get("/health")])?;
    let out = project.project_path().join("nested").join("diagnostics");

    project
        .run_apichain(&[
            "--quiet",
            "resolve",
            "-i",
            &input.display().to_string(),
            "--output-dir",
            &out.display().to_string(),
        ])?
        .assert_success();

    for file in [
        "consumers.json",
        "producers.json",
        "dependencies.json",
        "unresolved_dependencies.json",
        "ordering_constraints.json",
        "dict.json",
    ] {
        FileAssert::exists(out.join(file));
    }
    FileAssert::not_exists(project.out_path());
    Ok(())
}

#[test]
fn test_query_and_header_of_one_name_resolve_independently() -> Result<()> {
    let project = TestProject::new()?;
    project.write_config("resolve_header_dependencies = true\n")?;
    project.write_file(
        "dict.json",
        r#"{
  "restler_custom_payload_header": { "sessionId": ["abc"] },
  "restler_custom_payload_query": { "sessionId": ["def"] }
}"#,
    )?;
    let input = project.write_requests(vec![
        RequestFixture::get("/reports")
            .query("sessionId", PrimitiveType::String)
            .header("sessionId", PrimitiveType::String),
    ])?;

    project
        .run_apichain(&["resolve", "-i", &input.display().to_string(), "--dictionary", "dict.json"])?
        .assert_success()
        .assert_stdout_contains("Resolved 2/2 consumers");

    let dependencies = project.read_output("dependencies.json")?;
    let entries = dependencies_of(&dependencies, "sessionId", "/reports", "GET");
    let payload_types: Vec<&Value> = entries.iter().map(|d| &d["producer"]["payload"]["payload_type"]).collect();
    assert_eq!(payload_types, vec![&json!("query"), &json!("header")]);
    Ok(())
}

#[test]
fn test_root_body_property_binds_to_other_resource() -> Result<()> {
    let project = TestProject::new()?;
    let input = project.write_requests(vec![
        RequestFixture::post("/accounts").response_fields(&[("id", PrimitiveType::String)]),
        RequestFixture::post("/orders").body_fields(&[("accountId", PrimitiveType::String)]),
    ])?;

    project
        .run_apichain(&["resolve", "-i", &input.display().to_string()])?
        .assert_success()
        .assert_stdout_contains("Resolved 1/1 consumers");

    let dependencies = project.read_output("dependencies.json")?;
    let entries = dependencies_of(&dependencies, "/accountId", "/orders", "POST");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["producer"]["resource"]["request_id"], request("/accounts", "POST"));
    Ok(())
}
