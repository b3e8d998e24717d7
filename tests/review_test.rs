use std::fs;

use doc_tools::review::{IssueKind, Severity, check_markdown_headings, review_content, review_generated_docs, score};

fn kinds(file: &str, content: &str, extension: &str) -> Vec<IssueKind> {
    review_content(file, content, extension)
        .unwrap()
        .into_iter()
        .map(|i| i.kind)
        .collect()
}

#[test]
fn test_clean_asciidoc_has_no_issues() {
    let page = "= Topic Properties\n:description: Reference of topic properties.\n\n== retention.ms\n\nSee xref:manage:cluster-maintenance/disk-utilization.adoc[Disk utilization].\n";
    assert!(kinds("topic.adoc", page, "adoc").is_empty());
}

#[test]
fn test_asciidoc_problems() {
    let page = "= Title\n:description:\n\n==== Too deep\n\nTODO: describe this.\n\nSee xref:broken.adoc for more.\n\n{{ property.name }}\n";
    let issues = review_content("page.adoc", page, "adoc").unwrap();
    let found: Vec<(IssueKind, Option<usize>)> = issues.iter().map(|i| (i.kind, i.line)).collect();
    assert_eq!(
        found,
        vec![
            (IssueKind::EmptyDescription, Some(2)),
            (IssueKind::HeadingStructure, Some(4)),
            (IssueKind::Placeholder, Some(6)),
            (IssueKind::MalformedXref, Some(8)),
            (IssueKind::TemplateMarker, Some(10)),
        ]
    );
}

#[test]
fn test_listing_blocks_are_not_checked() {
    let page = "= Title\n:description: Example.\n\n----\n# TODO in a shell comment\n{{ .Values.image }}\n----\n";
    assert!(kinds("page.adoc", page, "adoc").is_empty());
}

#[test]
fn test_markdown_headings() {
    let issues = check_markdown_headings("README.md", "# One\n\n### Skipped\n\n# Two\n");
    let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["heading level jumps from 1 to 3", "more than one top-level heading"]
    );
    assert_eq!(issues[1].line, Some(5));
}

#[test]
fn test_json_checks() {
    let invalid = review_content("props.json", "{\n  \"a\": \n}", "json").unwrap();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].kind, IssueKind::InvalidJson);
    assert_eq!(invalid[0].severity, Severity::Error);

    let json = r#"{"properties": {"a": {"description": ""}, "b": {"description": null}, "c": {"description": "ok"}}}"#;
    let issues = review_content("props.json", json, "json").unwrap();
    let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "empty description at /properties/a/description",
            "empty description at /properties/b/description",
        ]
    );
}

#[test]
fn test_score() {
    let issues = review_content("p.adoc", "= T\n:description:\n{{ x }}\n", "adoc").unwrap();
    // one warning and one error
    assert_eq!(score(&issues), 88);
    assert_eq!(score(&[]), 100);

    let many = "{{ x }}\n".repeat(12);
    let issues = review_content("p.adoc", &many, "adoc").unwrap();
    assert_eq!(score(&issues), 0);
}

#[test]
fn test_review_directory_report() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("pages")).unwrap();
    fs::write(dir.path().join("pages/good.adoc"), "= Good\n:description: Fine.\n").unwrap();
    fs::write(dir.path().join("pages/bad.adoc"), "= Bad\n\nFIXME\n").unwrap();
    fs::write(dir.path().join("data.json"), "{}").unwrap();
    fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();

    let report = review_generated_docs(dir.path()).unwrap();
    assert_eq!(report.counts["files"], 3);
    assert_eq!(report.counts["issues"], 1);
    assert_eq!(report.counts["warnings"], 1);
    assert_eq!(report.counts["errors"], 0);
    assert_eq!(report.counts["score"], 98);

    let data = report.data.unwrap();
    assert_eq!(data["filesReviewed"], 3);
    assert_eq!(data["issues"][0]["file"], format!("pages{}bad.adoc", std::path::MAIN_SEPARATOR));
    assert_eq!(data["issues"][0]["kind"], "placeholder");
}

#[test]
fn test_missing_directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = review_generated_docs(&dir.path().join("missing")).unwrap_err();
    assert!(err.suggestion().is_some());
}
