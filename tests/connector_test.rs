use doc_tools::generate::rpcn_connector_docs::{apply_overrides, catalog, diff_against_previous};
use serde_json::json;

#[test]
fn test_override_alone_is_not_a_change() {
    let previous = json!({
        "inputs": [ { "name": "old_in", "status": "stable", "summary": "Old input" } ],
        "version": "4.50.0"
    });
    let dump = json!({
        "inputs": [ { "name": "old_in", "status": "stable", "summary": "Old input" } ],
        "version": "4.51.0"
    });
    let overrides = json!({ "inputs": [ { "name": "old_in", "status": "deprecated" } ] });

    let mut current = catalog(&dump);
    assert_eq!(apply_overrides(&mut current, &overrides), 1);
    assert_eq!(current[0].status, "deprecated");

    let diff = diff_against_previous(&previous, &current, Some(&overrides));
    assert!(diff.newly_deprecated.is_empty());
    assert!(diff.is_empty());
}

#[test]
fn test_upstream_deprecation_still_reported_with_overrides() {
    let previous = json!({
        "inputs": [
            { "name": "kafka", "status": "stable" },
            { "name": "amqp_0_9", "status": "stable" }
        ]
    });
    let dump = json!({
        "inputs": [
            { "name": "kafka", "status": "stable" },
            { "name": "amqp_0_9", "status": "deprecated" }
        ]
    });
    let overrides = json!({ "inputs": [ { "name": "kafka", "summary": "Consumes Kafka topics." } ] });

    let mut current = catalog(&dump);
    apply_overrides(&mut current, &overrides);

    let diff = diff_against_previous(&previous, &current, Some(&overrides));
    assert_eq!(diff.newly_deprecated, vec!["inputs/amqp_0_9"]);
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
}

#[test]
fn test_diff_without_overrides_uses_raw_catalogs() {
    let previous = json!({ "outputs": [ { "name": "http_client" } ] });
    let current = catalog(&json!({ "outputs": [] }));
    let diff = diff_against_previous(&previous, &current, None);
    assert_eq!(diff.removed, vec!["outputs/http_client"]);
}
