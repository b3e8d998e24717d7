use std::fs;

use doc_tools::proto::compare::{NoLocations, ProtoRepoResolver, diff_specs};
use doc_tools::proto::{CompareOptions, ReportFormat, Surface, compare_proto_descriptions};
use serde_json::{Value, json};

fn spec(summary: &str, description: &str) -> Value {
    json!({
        "openapi": "3.1.0",
        "info": { "title": "Admin API", "version": "v2" },
        "paths": {
            "/v2/brokers/{id}": {
                "parameters": [],
                "get": {
                    "operationId": "BrokerService_GetBroker",
                    "summary": summary,
                    "description": description
                }
            }
        }
    })
}

#[test]
fn test_diff_against_itself_is_empty() {
    let doc = spec("Get a broker", "Returns one broker.");
    let diff = diff_specs(&doc, &doc, &NoLocations);
    assert!(diff.differences.is_empty());
    assert!(diff.format_issues.is_empty());
}

#[test]
fn test_changed_description_is_flagged() {
    let current = spec("Get a broker", "Returns one broker.");
    let generated = spec("Get a broker", "Returns a single broker by node ID.");

    let diff = diff_specs(&current, &generated, &NoLocations);
    assert_eq!(diff.differences.len(), 1);

    let difference = &diff.differences[0];
    assert_eq!(difference.operation_id, "BrokerService_GetBroker");
    assert_eq!(difference.method, "get");
    assert!(difference.changes.description);
    assert!(!difference.changes.summary);
    assert!(difference.location.is_none());
}

#[test]
fn test_whitespace_only_change_is_a_format_issue() {
    let current = spec("Get a broker", "Returns one broker.");
    let generated = spec("Get a broker", "Returns  one\nbroker.");

    let diff = diff_specs(&current, &generated, &NoLocations);
    assert!(diff.differences.is_empty());
    assert_eq!(diff.format_issues.len(), 1);
    assert_eq!(diff.format_issues[0].field, "description");
}

#[test]
fn test_operation_id_falls_back_to_generated() {
    let mut current = spec("Get a broker", "Old text.");
    current["paths"]["/v2/brokers/{id}"]["get"]
        .as_object_mut()
        .unwrap()
        .remove("operationId");
    let generated = spec("Get a broker", "New text.");

    let diff = diff_specs(&current, &generated, &NoLocations);
    assert_eq!(diff.differences.len(), 1);
    assert_eq!(diff.differences[0].operation_id, "BrokerService_GetBroker");
}

#[test]
fn test_operations_missing_from_generated_are_ignored() {
    let current = spec("Get a broker", "Old text.");
    let generated = json!({ "openapi": "3.1.0", "paths": {} });

    let diff = diff_specs(&current, &generated, &NoLocations);
    assert!(diff.differences.is_empty());
}

#[test]
fn test_proto_repo_resolver_locates_rpc() {
    let repo = tempfile::tempdir().unwrap();
    let proto_dir = repo.path().join("proto/redpanda/core/admin/v2");
    fs::create_dir_all(&proto_dir).unwrap();
    fs::write(
        proto_dir.join("broker.proto"),
        "syntax = \"proto3\";\n\
         \n\
         service BrokerService {\n\
         \x20 // Returns a single broker.\n\
         \x20 rpc GetBroker(GetBrokerRequest) returns (GetBrokerResponse) {}\n\
         }\n",
    )
    .unwrap();

    let resolver = ProtoRepoResolver::new(repo.path().to_path_buf(), Surface::Admin);
    let current = spec("Get a broker", "Old text.");
    let generated = spec("Get a broker", "Returns a single broker.");

    let diff = diff_specs(&current, &generated, &resolver);
    let location = diff.differences[0].location.as_ref().unwrap();
    assert!(location.found);
    assert_eq!(location.rpc_line_number, Some(5));
    assert_eq!(location.description_line_number, Some(4));
    assert_eq!(location.current_proto_description.as_deref(), Some("Returns a single broker."));
}

#[tokio::test]
async fn test_compare_writes_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let current = dir.path().join("current.json");
    let generated = dir.path().join("generated.json");
    let output = dir.path().join("out/report.json");
    fs::write(&current, spec("Get a broker", "Old text.").to_string()).unwrap();
    fs::write(&generated, spec("Get a broker", "New text.").to_string()).unwrap();

    let options = CompareOptions {
        surface: Surface::Admin,
        current_spec: current,
        generated_spec: generated,
        proto_repo: None,
        format: ReportFormat::Json,
        since_ref: None,
        include_preview: false,
        output: Some(output.clone()),
    };
    let report = compare_proto_descriptions(&options).await.unwrap();
    assert_eq!(report.counts["differences"], 1);
    assert_eq!(report.counts["skippedPreview"], 0);

    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["summary"]["totalDifferences"], 1);
    assert_eq!(written["differences"][0]["operationId"], "BrokerService_GetBroker");
}

#[tokio::test]
async fn test_compare_missing_spec_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let options = CompareOptions {
        surface: Surface::Admin,
        current_spec: dir.path().join("missing.yaml"),
        generated_spec: dir.path().join("missing.yaml"),
        proto_repo: None,
        format: ReportFormat::Report,
        since_ref: None,
        include_preview: false,
        output: None,
    };
    let err = compare_proto_descriptions(&options).await.unwrap_err();
    assert!(err.suggestion().is_some());
}
