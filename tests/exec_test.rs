use doc_tools::error::DocToolsError;
use doc_tools::exec::{CommandSpec, run};

#[test]
fn test_command_line_display() {
    let spec = CommandSpec::new("helm-docs").args(["--chart-search-root", "charts/redpanda"]);
    assert_eq!(spec.display(), "helm-docs --chart-search-root charts/redpanda");
}

#[tokio::test]
async fn test_missing_program_reports_install_hint() {
    let spec = CommandSpec::new("doc-tools-no-such-binary").arg("--version");
    let err = run(spec).await.unwrap_err();
    match &err {
        DocToolsError::MissingDependency { tool, install } => {
            assert_eq!(tool, "doc-tools-no-such-binary");
            assert!(install.contains("PATH"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.suggestion().is_some());
}
