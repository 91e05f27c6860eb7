//! Diagnostics must be byte-identical across runs and request orders.

use crate::common::TestProject;
use anyhow::Result;
use apichain_cli::grammar::{PrimitiveType, Tree};
use apichain_cli::test_utils::RequestFixture;
use std::fs;

const FILES: [&str; 6] = [
    "consumers.json",
    "producers.json",
    "dependencies.json",
    "unresolved_dependencies.json",
    "ordering_constraints.json",
    "dict.json",
];

fn requests() -> Vec<RequestFixture> {
    vec![
        RequestFixture::post("/stores").response_fields(&[("id", PrimitiveType::String)]),
        RequestFixture::put("/stores/{storeId}").body_fields(&[("name", PrimitiveType::String)]),
        RequestFixture::get("/stores/{storeId}/orders").query("status", PrimitiveType::String),
        RequestFixture::post("/stores/{storeId}/orders").body(Tree::object(
            "",
            vec![
                Tree::fuzzable_leaf("id", PrimitiveType::String),
                Tree::fuzzable_leaf("name", PrimitiveType::String),
                Tree::array(
                    "lineItems",
                    Tree::object("", vec![Tree::fuzzable_leaf("productId", PrimitiveType::String)]),
                ),
            ],
        )),
        RequestFixture::post("/products").response_fields(&[("id", PrimitiveType::String)]),
    ]
}

fn run(project: &TestProject, requests: Vec<RequestFixture>, out: &str) -> Result<Vec<String>> {
    let input = project.write_requests(requests)?;
    project
        .run_apichain(&["--quiet", "resolve", "-i", &input.display().to_string(), "-o", out])?
        .assert_success();
    FILES
        .iter()
        .map(|file| Ok(fs::read_to_string(project.project_path().join(out).join(file))?))
        .collect()
}

#[test]
fn test_repeated_runs_are_identical() -> Result<()> {
    let project = TestProject::new()?;
    let first = run(&project, requests(), "first")?;
    for attempt in 0..3 {
        let again = run(&project, requests(), &format!("run-{attempt}"))?;
        assert_eq!(first, again, "run {attempt} differs");
    }
    Ok(())
}

#[test]
fn test_request_order_does_not_matter() -> Result<()> {
    let project = TestProject::new()?;
    let forward = run(&project, requests(), "forward")?;

    let mut reversed = requests();
    reversed.reverse();
    let backward = run(&project, reversed, "backward")?;

    for (file, (a, b)) in FILES.iter().zip(forward.iter().zip(&backward)) {
        assert_eq!(a, b, "{file} depends on request order");
    }
    Ok(())
}
