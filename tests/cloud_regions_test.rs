use std::fs;

use doc_tools::generate::cloud_regions::{
    CloudRegionsOptions, RegionsFormat, RegionsSource, generate_cloud_regions, group_regions, parse_regions,
    render_regions,
};

const REGIONS_YAML: &str = "regions:
  - name: westeurope
    displayName: West Europe
    provider: azure
    zones: [westeurope-az1]
    clusterTypes: [byoc]
  - name: us-east-1
    displayName: N. Virginia
    provider: aws
    zones: [use1-az1, use1-az2]
    clusterTypes: [dedicated, byoc]
  - name: us-central1
    displayName: Iowa
    provider: gcp
    zones: [us-central1-a]
    clusterTypes: [dedicated]
  - name: ap-south-1
    displayName: Mumbai
    provider: aws
    zones: [aps1-az1]
    clusterTypes: [dedicated]
  - name: us-gov-west-1
    displayName: GovCloud
    provider: aws
    public: false
    clusterTypes: [dedicated]
";

#[test]
fn test_groups_follow_provider_order() {
    let regions = parse_regions(REGIONS_YAML).unwrap();
    let groups = group_regions(&regions, None, false);

    let providers: Vec<&str> = groups.iter().map(|g| g.display_name.as_str()).collect();
    assert_eq!(providers, vec!["AWS", "GCP", "Azure"]);

    let aws: Vec<&str> = groups[0].regions.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(aws, vec!["ap-south-1", "us-east-1"]);
}

#[test]
fn test_private_regions_need_opt_in() {
    let regions = parse_regions(REGIONS_YAML).unwrap();
    let groups = group_regions(&regions, None, true);
    assert_eq!(groups[0].regions.len(), 3);
}

#[test]
fn test_tier_filter() {
    let regions = parse_regions(REGIONS_YAML).unwrap();
    let groups = group_regions(&regions, Some("BYOC"), false);

    let names: Vec<&str> = groups
        .iter()
        .flat_map(|g| g.regions.iter().map(|r| r.name.as_str()))
        .collect();
    assert_eq!(names, vec!["us-east-1", "westeurope"]);
}

#[test]
fn test_render_adoc_and_markdown() {
    let regions = parse_regions(REGIONS_YAML).unwrap();
    let groups = group_regions(&regions, None, false);

    let adoc = render_regions(&groups, None, RegionsFormat::Adoc).unwrap();
    assert!(adoc.contains("== AWS"));
    assert!(adoc.contains("|us-east-1 |N. Virginia |use1-az1, use1-az2"));
    assert!(adoc.find("== AWS").unwrap() < adoc.find("== Azure").unwrap());

    let md = render_regions(&groups, None, RegionsFormat::Md).unwrap();
    assert!(md.contains("## GCP"));
    assert!(md.contains("| `us-central1` | Iowa | us-central1-a |"));
}

#[test]
fn test_custom_template() {
    let regions = parse_regions(REGIONS_YAML).unwrap();
    let groups = group_regions(&regions, Some("dedicated"), false);
    let template = "{% for group in groups %}{{ group.provider }}={{ group.regions | length }};{% endfor %}";

    let rendered = render_regions(&groups, Some(template), RegionsFormat::Adoc).unwrap();
    assert_eq!(rendered, "aws=2;gcp=1;\n");
}

#[tokio::test]
async fn test_generate_from_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("regions.yaml");
    fs::write(&source, REGIONS_YAML).unwrap();
    let output = dir.path().join("partials/regions.adoc");

    let options = CloudRegionsOptions {
        source: RegionsSource::Local(source),
        output: output.clone(),
        ..Default::default()
    };
    let report = generate_cloud_regions(&options, None).await.unwrap();
    assert_eq!(report.counts["providers"], 3);
    assert_eq!(report.counts["regions"], 4);
    assert!(fs::read_to_string(&output).unwrap().contains("== GCP"));
}

#[tokio::test]
async fn test_github_source_without_client_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let options = CloudRegionsOptions {
        output: dir.path().join("regions.adoc"),
        ..Default::default()
    };
    let err = generate_cloud_regions(&options, None).await.unwrap_err();
    assert!(err.suggestion().is_some());
}
