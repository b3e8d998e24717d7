use std::fs;

use doc_tools::proto::Surface;
use doc_tools::proto::locator::find_proto_file;
use doc_tools::proto::preview::{filter_preview, preview_operations_in_text};
use doc_tools::proto::rpc::locate_rpc_in_text;
use doc_tools::proto::{Difference, OperationRef};

const BROKER_PROTO: &str = "syntax = \"proto3\";

service BrokerService {
  // GetBroker returns
  // a single broker.
  rpc GetBroker(GetBrokerRequest) returns (GetBrokerResponse) {
    option (google.api.http) = {get: \"/v2/brokers/{id}\"};
  }
  rpc ListBrokers(ListBrokersRequest) returns (ListBrokersResponse);
}
";

#[test]
fn test_locate_rpc_with_comment_block() {
    let location = locate_rpc_in_text(BROKER_PROTO, "GetBroker", "broker.proto").unwrap();
    assert!(location.found);
    assert_eq!(location.rpc_line_number, Some(6));
    assert_eq!(location.description_line_number, Some(4));
    assert_eq!(
        location.current_proto_description.as_deref(),
        Some("GetBroker returns a single broker.")
    );
    let definition = location.rpc_definition.unwrap();
    assert!(definition.starts_with("  rpc GetBroker("));
    assert!(definition.ends_with("  }"));
}

#[test]
fn test_locate_bodyless_rpc() {
    let location = locate_rpc_in_text(BROKER_PROTO, "ListBrokers", "broker.proto").unwrap();
    assert!(location.found);
    assert_eq!(location.rpc_line_number, Some(9));
    // The line above closes GetBroker, so there is no comment to use
    assert_eq!(location.description_line_number, Some(9));
    assert_eq!(location.current_proto_description, None);
}

#[test]
fn test_locate_rpc_from_option_description() {
    let text = "service S {\n  rpc Foo(A) returns (B) {\n    option (openapi) = {\n      description: \"Does foo.\"\n    };\n  }\n}\n";
    let location = locate_rpc_in_text(text, "Foo", "s.proto").unwrap();
    assert_eq!(location.description_line_number, Some(4));
    assert_eq!(location.current_proto_description.as_deref(), Some("Does foo."));
}

#[test]
fn test_missing_rpc_is_reported_not_raised() {
    let location = locate_rpc_in_text(BROKER_PROTO, "DeleteBroker", "broker.proto").unwrap();
    assert!(!location.found);
    assert_eq!(location.error.as_deref(), Some("rpc DeleteBroker not found in broker.proto"));
}

#[test]
fn test_find_proto_file_scans_when_unmapped() {
    let repo = tempfile::tempdir().unwrap();
    let dir = repo.path().join("proto/redpanda/core/admin/v3");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("topics.proto"), "service TopicService {\n}\n").unwrap();

    let found = find_proto_file(repo.path(), Surface::Admin, "TopicService").unwrap();
    assert_eq!(found, dir.join("topics.proto"));
    assert!(find_proto_file(repo.path(), Surface::Admin, "NoSuchService").is_none());
}

#[test]
fn test_operation_ref_parsing() {
    let dotted = OperationRef::parse("redpanda.core.admin.v2.BrokerService.GetBroker").unwrap();
    assert_eq!(dotted.service, "BrokerService");
    assert_eq!(dotted.rpc, "GetBroker");

    let underscored = OperationRef::parse("ClusterService_ListClusters").unwrap();
    assert_eq!(underscored.preview_key(), "ClusterService_ListClusters");

    assert!(OperationRef::parse("nounderscore").is_none());
}

const PREVIEW_PROTO: &str = "service ShadowLinkService {
  option (pbgen.service) = RESTRICTION_PREVIEW;
  rpc CreateShadowLink(A) returns (B) {}
  rpc DeleteShadowLink(A) returns (B) {}
}

service ClusterService {
  rpc ListA(Req) returns (Resp) {
    option (pbgen.rpc) = {
      restriction: RESTRICTION_PREVIEW
    };
  }
  rpc ListB(Req) returns (Resp);
}
";

#[test]
fn test_preview_marks_service_and_rpc() {
    let keys = preview_operations_in_text(PREVIEW_PROTO).unwrap();
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "ClusterService_ListA",
            "ShadowLinkService_CreateShadowLink",
            "ShadowLinkService_DeleteShadowLink",
        ]
    );
}

fn difference(operation_id: &str) -> Difference {
    Difference {
        path: "/x".to_string(),
        method: "get".to_string(),
        operation_id: operation_id.to_string(),
        current: Default::default(),
        generated: Default::default(),
        changes: Default::default(),
        location: None,
    }
}

#[test]
fn test_filter_preview_partitions_every_difference() {
    let preview = preview_operations_in_text(PREVIEW_PROTO).unwrap();
    let differences = vec![
        difference("ClusterService_ListA"),
        difference("ClusterService_ListB"),
        difference("redpanda.core.admin.v2.ShadowLinkService.CreateShadowLink"),
        difference("garbage"),
    ];

    let partition = filter_preview(differences, &preview);
    assert_eq!(partition.filtered.len() + partition.skipped.len(), 4);
    assert_eq!(partition.skipped.len(), 2);
    assert!(
        partition
            .filtered
            .iter()
            .any(|d| d.operation_id == "garbage")
    );
}

#[test]
fn test_preview_rpc_with_wrapped_signature() {
    let text = "service BrokerService {
  rpc GetBroker(GetBrokerRequest) returns (GetBrokerResponse);
  rpc ListBrokersWithAVeryLongName(ListBrokersWithAVeryLongNameRequest)
      returns (ListBrokersWithAVeryLongNameResponse) {
    option (pbgen.rpc) = {
      restriction: RESTRICTION_PREVIEW
    };
  }
  rpc GetCluster(GetClusterRequest)
      returns (GetClusterResponse);
}
";
    let keys = preview_operations_in_text(text).unwrap();
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    assert_eq!(keys, vec!["BrokerService_ListBrokersWithAVeryLongName"]);
}

#[test]
fn test_preview_service_brace_on_next_line() {
    let text = "service ShadowLinkService
{
  option (pbgen.service) = RESTRICTION_PREVIEW;
  rpc CreateShadowLink(A) returns (B) {}
}

service BrokerService
{
  rpc GetBroker(A) returns (B);
}
";
    let keys = preview_operations_in_text(text).unwrap();
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    assert_eq!(keys, vec!["ShadowLinkService_CreateShadowLink"]);
}
