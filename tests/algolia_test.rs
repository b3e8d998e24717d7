use std::fs;
use std::path::PathBuf;

use doc_tools::algolia::{
    AlgoliaRecord, ExistingRecord, IndexOptions, MAX_CONTENT_BYTES, collect_site_records, index_site, plan_sync,
    records_from_html,
};
use doc_tools::config::Config;

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>rpk topic | Redpanda Docs</title></head>
<body>
  <nav><p>Navigation is not indexed</p></nav>
  <main>
    <article>
      <h1>rpk   topic</h1>
      <p>Manage   topics.</p>
      <h2>Usage</h2>
      <ul><li>rpk topic create</li></ul>
      <h2>Usage</h2>
      <h3>Flags</h3>
      <table><tr><td>--brokers</td></tr></table>
    </article>
  </main>
</body>
</html>"#;

fn existing(object_id: &str, hash: Option<&str>) -> ExistingRecord {
    ExistingRecord {
        object_id: object_id.to_string(),
        hash: hash.map(str::to_string),
    }
}

fn record(url: &str, content: &str) -> AlgoliaRecord {
    let html = format!("<html><body><article><h1>T</h1><p>{content}</p></article></body></html>");
    records_from_html(&html, url).unwrap().unwrap()
}

#[test]
fn test_record_from_page() {
    let record = records_from_html(PAGE, "https://docs.redpanda.com/rpk-topic.html")
        .unwrap()
        .unwrap();
    assert_eq!(record.object_id, "https://docs.redpanda.com/rpk-topic.html");
    assert_eq!(record.title, "rpk topic");
    assert_eq!(record.headings, vec!["Usage", "Flags"]);
    assert_eq!(record.content, "Manage topics. rpk topic create --brokers");
    assert_eq!(record.hash.len(), 64);
}

#[test]
fn test_title_falls_back_to_title_element() {
    let html = "<html><head><title>Only title</title></head><body></body></html>";
    let record = records_from_html(html, "u").unwrap().unwrap();
    assert_eq!(record.title, "Only title");
    assert!(record.content.is_empty());
}

#[test]
fn test_empty_page_has_no_record() {
    assert!(records_from_html("<html><body><div></div></body></html>", "u").unwrap().is_none());
}

#[test]
fn test_content_is_truncated() {
    let long = "word ".repeat(MAX_CONTENT_BYTES);
    let record = record("u", &long);
    assert_eq!(record.content.len(), MAX_CONTENT_BYTES);
}

#[test]
fn test_truncation_respects_bytes_and_char_boundaries() {
    // Three bytes per char, so the limit falls inside a char
    let long = "€".repeat(MAX_CONTENT_BYTES);
    let record = record("u", &long);
    assert_eq!(record.content.len(), MAX_CONTENT_BYTES - MAX_CONTENT_BYTES % 3);
    assert!(record.content.chars().all(|c| c == '€'));
}

#[test]
fn test_hash_tracks_content() {
    assert_eq!(record("u", "same").hash, record("u", "same").hash);
    assert_ne!(record("u", "same").hash, record("u", "different").hash);
}

#[test]
fn test_plan_sync() {
    let unchanged = record("https://d/a.html", "a");
    let changed = record("https://d/b.html", "b2");
    let added = record("https://d/c.html", "c");

    let index = vec![
        existing("https://d/a.html", Some(unchanged.hash.as_str())),
        existing("https://d/b.html", Some("stale")),
        existing("https://d/gone.html", Some("x")),
    ];
    let plan = plan_sync(&index, vec![unchanged, changed, added]);

    assert_eq!(plan.skipped, 1);
    let updated: Vec<&str> = plan.update.iter().map(|r| r.object_id.as_str()).collect();
    assert_eq!(updated, vec!["https://d/b.html", "https://d/c.html"]);
    assert_eq!(plan.delete, vec!["https://d/gone.html"]);
}

#[test]
fn test_records_without_hash_are_updated() {
    let fresh = record("https://d/a.html", "a");
    let plan = plan_sync(&[existing("https://d/a.html", None)], vec![fresh]);
    assert_eq!(plan.update.len(), 1);
    assert_eq!(plan.skipped, 0);
}

fn write_site() -> tempfile::TempDir {
    let site = tempfile::tempdir().unwrap();
    fs::create_dir_all(site.path().join("current/get-started")).unwrap();
    fs::write(site.path().join("current/get-started/intro.html"), PAGE).unwrap();
    fs::write(site.path().join("404.html"), PAGE).unwrap();
    fs::write(site.path().join("site.css"), "body {}").unwrap();
    site
}

#[test]
fn test_collect_site_records_skips_404() {
    let site = write_site();
    let records = collect_site_records(site.path(), "https://docs.redpanda.com/").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, "https://docs.redpanda.com/current/get-started/intro.html");
}

#[tokio::test]
async fn test_dry_run_needs_no_credentials() {
    let site = write_site();
    let config = Config::from_lookup(|_| None, PathBuf::from("."));
    let options = IndexOptions {
        site_dir: site.path().to_path_buf(),
        base_url: "https://docs.redpanda.com".to_string(),
        dry_run: true,
    };

    let report = index_site(&config, &options).await.unwrap();
    assert_eq!(report.counts["pages"], 1);
    assert_eq!(report.counts["updated"], 1);
    assert_eq!(report.counts["deleted"], 0);

    let options = IndexOptions { dry_run: false, ..options };
    assert!(index_site(&config, &options).await.is_err());
}
