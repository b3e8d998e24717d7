use std::fs;

use doc_tools::antora::{
    link_readme, normalize_resource_id, read_prerelease, update_antora_file, update_version_attributes,
};

const ANTORA_YML: &str = "name: ROOT
title: Self-Managed
version: 25.1
prerelease: false
asciidoc:
  attributes:
    # Used by the install pages
    latest-redpanda-version: 'v25.1.2'
    latest-console-version: \"v3.0.0\"
    page-header-data:
      order: 2
";

#[test]
fn test_update_touches_only_the_attribute_line() {
    let updated = update_version_attributes(ANTORA_YML, &[("latest-redpanda-version", "v25.1.3")]).unwrap();

    let before: Vec<&str> = ANTORA_YML.lines().collect();
    let after: Vec<&str> = updated.lines().collect();
    assert_eq!(before.len(), after.len());
    for (old, new) in before.iter().zip(&after) {
        if old.contains("latest-redpanda-version") {
            assert_eq!(*new, "    latest-redpanda-version: 'v25.1.3'");
        } else {
            assert_eq!(old, new);
        }
    }
}

#[test]
fn test_update_keeps_double_quotes() {
    let updated = update_version_attributes(ANTORA_YML, &[("latest-console-version", "v3.1.0")]).unwrap();
    assert!(updated.contains("    latest-console-version: \"v3.1.0\"\n"));
}

#[test]
fn test_missing_attribute_is_inserted_under_attributes() {
    let updated = update_version_attributes(ANTORA_YML, &[("latest-operator-version", "v25.1.1")]).unwrap();
    assert!(updated.contains("  attributes:\n    latest-operator-version: 'v25.1.1'\n"));

    let doc: serde_yaml::Value = serde_yaml::from_str(&updated).unwrap();
    assert_eq!(
        doc["asciidoc"]["attributes"]["latest-operator-version"].as_str(),
        Some("v25.1.1")
    );
    assert_eq!(
        doc["asciidoc"]["attributes"]["latest-redpanda-version"].as_str(),
        Some("v25.1.2")
    );
}

#[test]
fn test_missing_asciidoc_block_is_created() {
    let updated = update_version_attributes("name: ROOT\nversion: 25.1\n", &[("latest-redpanda-version", "v25.1.3")]).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&updated).unwrap();
    assert_eq!(
        doc["asciidoc"]["attributes"]["latest-redpanda-version"].as_str(),
        Some("v25.1.3")
    );
}

#[test]
fn test_update_antora_file_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("antora.yml");
    fs::write(&path, ANTORA_YML).unwrap();

    update_antora_file(&path, &[("latest-redpanda-version", "v25.1.3")]).unwrap();
    assert!(fs::read_to_string(&path).unwrap().contains("'v25.1.3'"));

    let missing = dir.path().join("nope.yml");
    let err = update_antora_file(&missing, &[("a", "b")]).unwrap_err();
    assert!(err.suggestion().is_some());
}

#[test]
fn test_read_prerelease() {
    assert!(!read_prerelease(ANTORA_YML).unwrap());
    assert!(read_prerelease("name: ROOT\nprerelease: true\n").unwrap());
    assert!(read_prerelease("name: ROOT\nprerelease: -beta\n").unwrap());
    assert!(!read_prerelease("name: ROOT\n").unwrap());
}

#[test]
fn test_normalize_resource_id() {
    assert_eq!(normalize_resource_id("ROOT:console:config.adoc"), "current@ROOT:console:config.adoc");
    assert_eq!(normalize_resource_id("24.3@ROOT:console:config.adoc"), "24.3@ROOT:console:config.adoc");
    assert_eq!(normalize_resource_id(""), "");
}

#[test]
fn test_link_readme() {
    let root = tempfile::tempdir().unwrap();
    let subdir = root.path().join("tools/doc-tools");
    fs::create_dir_all(&subdir).unwrap();
    fs::write(subdir.join("README.adoc"), "= Doc tools\n").unwrap();

    let link = link_readme(root.path(), "tools/doc-tools", "reference/doc-tools.adoc").unwrap();
    assert_eq!(link, root.path().join("modules/ROOT/pages/reference/doc-tools.adoc"));
    assert_eq!(fs::read_to_string(&link).unwrap(), "= Doc tools\n");

    // Linking again replaces the existing page
    link_readme(root.path(), "tools/doc-tools", "reference/doc-tools.adoc").unwrap();
    assert_eq!(fs::read_to_string(&link).unwrap(), "= Doc tools\n");
}

#[test]
fn test_link_readme_rejects_traversal_and_missing_readme() {
    let root = tempfile::tempdir().unwrap();
    assert!(link_readme(root.path(), "../elsewhere", "x.adoc").is_err());
    assert!(link_readme(root.path(), "missing", "x.adoc").is_err());
}
