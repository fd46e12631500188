//! CLI surface tests: argument handling and fatal-error reporting.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn harvester() -> Command {
    #[allow(clippy::expect_used)]
    Command::cargo_bin("opensearch-harvester").expect("binary built")
}

#[test]
fn test_missing_config_file_fails() {
    harvester()
        .args(["gather", "--config", "does-not-exist.json", "--schemas", "x.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_config_fails_before_network() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("source.json");
    let schemas = dir.path().join("collections.json");
    fs::write(&config, r#"{"base_query_url": "https://example.com/search"}"#).unwrap();
    fs::write(&schemas, "{}").unwrap();

    harvester()
        .args([
            "gather",
            "--config",
            config.to_str().unwrap(),
            "--schemas",
            schemas.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_unknown_collection_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("source.json");
    let schemas = dir.path().join("collections.json");
    fs::write(
        &config,
        r#"{
            "base_query_url": "https://example.com/search",
            "page_size_keyword": "rows",
            "page_start_keyword": "start",
            "collection": "MISSING"
        }"#,
    )
    .unwrap();
    fs::write(&schemas, "{}").unwrap();

    harvester()
        .args([
            "gather",
            "--config",
            config.to_str().unwrap(),
            "--schemas",
            schemas.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown collection"));
}

#[test]
fn test_missing_output_directory_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("source.json");
    let schemas = dir.path().join("collections.json");
    fs::write(
        &config,
        r#"{
            "base_query_url": "https://example.com/search",
            "page_size_keyword": "rows",
            "page_start_keyword": "start",
            "collection": "C"
        }"#,
    )
    .unwrap();
    fs::write(
        &schemas,
        r#"{"C": {"entry_list_path": ["feed", "entry"], "mandatory_fields": {"identifier": {"path": ["id"]}}}}"#,
    )
    .unwrap();

    harvester()
        .args([
            "gather",
            "--config",
            config.to_str().unwrap(),
            "--schemas",
            schemas.to_str().unwrap(),
            "--output",
            dir.path().join("nope").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Output directory does not exist"));
}
