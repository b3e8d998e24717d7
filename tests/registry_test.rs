use std::fs;
use std::sync::Arc;
use std::time::Duration;

use doc_tools::cache::{ManualClock, TtlCache};
use doc_tools::config::{CACHE_TTL, Config, JOB_RETENTION};
use doc_tools::github::GitHubConnector;
use doc_tools::jobs::JobQueue;
use doc_tools::server::registry::within_docs_root;
use doc_tools::server::{ToolContext, ToolInvocation, ToolName, validate_registry};
use serde_json::{Value, json};

#[test]
fn test_registry_is_consistent() {
    validate_registry().unwrap();
    assert_eq!(ToolName::ALL.len(), 16);
    for tool in ToolName::ALL {
        assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
    }
}

#[test]
fn test_unknown_tool_is_rejected() {
    let err = ToolInvocation::parse("delete_everything", json!({})).unwrap_err();
    assert!(err.to_string().contains("unknown tool"));
}

#[test]
fn test_arguments_are_typed() {
    let invocation = ToolInvocation::parse("get_redpanda_version", Value::Null).unwrap();
    assert_eq!(invocation.tool(), ToolName::GetRedpandaVersion);

    let err = ToolInvocation::parse("review_generated_docs", json!({})).unwrap_err();
    assert!(err.to_string().contains("invalid arguments for review_generated_docs"));

    let err = ToolInvocation::parse("generate_rpk_docs", json!({ "max_depth": "deep" })).unwrap_err();
    assert!(err.to_string().contains("generate_rpk_docs"));
}

#[test]
fn test_background_only_where_supported() {
    let rpk = ToolInvocation::parse("generate_rpk_docs", json!({ "background": true })).unwrap();
    assert!(rpk.wants_background());

    let inline = ToolInvocation::parse("generate_rpk_docs", json!({})).unwrap();
    assert!(!inline.wants_background());

    let helm = ToolInvocation::parse("get_helm_chart_versions", json!({ "background": true })).unwrap();
    assert!(!helm.wants_background());
    assert!(!ToolName::ListJobs.supports_background());
}

fn context(docs_root: &std::path::Path) -> ToolContext {
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(TtlCache::new(CACHE_TTL, clock.clone()));
    let config = Config::from_lookup(|_| None, docs_root.to_path_buf());
    ToolContext {
        config: Arc::new(config),
        github: Arc::new(GitHubConnector::new(None, cache).unwrap()),
        jobs: JobQueue::new(JOB_RETENTION, clock),
    }
}

fn data(outcome: &doc_tools::error::ToolOutcome) -> Value {
    outcome.data.clone().unwrap()
}

#[tokio::test]
async fn test_review_runs_inline_against_docs_root() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("modules/reference/pages")).unwrap();
    fs::write(root.path().join("modules/reference/pages/a.adoc"), "= A\n:description: A.\n").unwrap();
    let ctx = context(root.path());

    let invocation = ToolInvocation::parse("review_generated_docs", json!({ "directory": "modules/reference" })).unwrap();
    let outcome = invocation.dispatch(&ctx).await;
    assert!(outcome.success);
    assert_eq!(outcome.counts["files"], 1);
    assert_eq!(outcome.counts["score"], 100);
}

#[tokio::test]
async fn test_review_directory_must_stay_under_docs_root() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("modules")).unwrap();
    let ctx = context(root.path());

    for directory in ["/etc", "../outside", "modules/../../outside"] {
        let invocation = ToolInvocation::parse("review_generated_docs", json!({ "directory": directory })).unwrap();
        let outcome = invocation.dispatch(&ctx).await;
        assert!(!outcome.success, "{directory} was accepted");
        assert!(outcome.error.unwrap().contains("must not contain '..'"));
    }
}

#[test]
fn test_within_docs_root() {
    let root = std::path::Path::new("/docs");
    assert_eq!(
        within_docs_root(root, "./modules/reference").unwrap(),
        root.join("./modules/reference")
    );
    assert!(within_docs_root(root, "/tmp/x").is_err());
    assert!(within_docs_root(root, "a/../b").is_err());
}

#[tokio::test]
async fn test_rejected_command_fails_with_suggestion() {
    let root = tempfile::tempdir().unwrap();
    let ctx = context(root.path());

    let invocation = ToolInvocation::parse("run_doc_tools_command", json!({ "command": "review; rm -rf /" })).unwrap();
    let outcome = invocation.dispatch(&ctx).await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("disallowed character"));
    assert!(outcome.suggestion.is_some());
}

#[tokio::test]
async fn test_background_call_is_tracked_as_a_job() {
    let root = tempfile::tempdir().unwrap();
    let ctx = context(root.path());

    let invocation =
        ToolInvocation::parse("run_doc_tools_command", json!({ "command": "mcp", "background": true })).unwrap();
    let queued = invocation.dispatch(&ctx).await;
    assert!(queued.success);
    assert_eq!(data(&queued)["status"], "queued");
    let job_id = data(&queued)["jobId"].as_str().unwrap().to_string();

    let mut status = Value::Null;
    for _ in 0..200 {
        let poll = ToolInvocation::parse("get_job_status", json!({ "job_id": job_id })).unwrap();
        status = data(&poll.dispatch(&ctx).await);
        if status["status"] == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status["status"], "failed");
    assert_eq!(status["result"]["success"], false);

    let listed = ToolInvocation::parse("list_jobs", Value::Null).unwrap().dispatch(&ctx).await;
    assert_eq!(listed.counts["jobs"], 1);
    assert_eq!(data(&listed)[0]["tool"], "run_doc_tools_command");
}

#[tokio::test]
async fn test_bad_job_id_is_a_validation_error() {
    let root = tempfile::tempdir().unwrap();
    let ctx = context(root.path());

    let outcome = ToolInvocation::parse("get_job_status", json!({ "job_id": "not-a-uuid" }))
        .unwrap()
        .dispatch(&ctx)
        .await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("invalid job id"));
}
