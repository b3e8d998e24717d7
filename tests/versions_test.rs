use std::sync::Mutex;

use async_trait::async_trait;
use doc_tools::github::{ReleaseInfo, RepoSource};
use doc_tools::versions::{
    CHART_PATH, ProductVersion, helm_chart_versions, redpanda_version, release_branch_for_tag, select_latest,
};

/// In-memory stand-in for GitHub that records every file request
#[derive(Default)]
struct FakeRepo {
    releases: Vec<ReleaseInfo>,
    charts: Vec<(String, String)>,
    requests: Mutex<Vec<String>>,
}

#[async_trait]
impl RepoSource for FakeRepo {
    async fn list_releases(&self, _owner: &str, _repo: &str) -> anyhow::Result<Vec<ReleaseInfo>> {
        Ok(self.releases.clone())
    }

    async fn file_at_ref(&self, _owner: &str, _repo: &str, path: &str, reference: &str) -> anyhow::Result<String> {
        self.requests.lock().unwrap().push(format!("{reference}:{path}"));
        self.charts
            .iter()
            .find(|(branch, _)| branch == reference)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| anyhow::anyhow!("no such ref {reference}"))
    }
}

fn release(tag: &str, prerelease: bool) -> ReleaseInfo {
    ReleaseInfo {
        tag: tag.to_string(),
        prerelease,
        draft: false,
    }
}

#[test]
fn test_select_latest_uses_semver_order() {
    let releases = vec![
        release("v24.3.9", false),
        release("v25.1.10", false),
        release("v25.1.2", false),
        release("not-a-version", false),
    ];
    let latest = select_latest(&releases);
    assert_eq!(latest.latest_stable.as_deref(), Some("v25.1.10"));
    assert_eq!(latest.latest_beta, None);
}

#[test]
fn test_beta_only_reported_when_newer_than_stable() {
    let older_beta = vec![release("v25.1.3", false), release("v25.1.1-rc2", true)];
    assert_eq!(select_latest(&older_beta).latest_beta, None);

    let newer_beta = vec![release("v25.1.3", false), release("v25.2.1-rc1", true)];
    assert_eq!(select_latest(&newer_beta).latest_beta.as_deref(), Some("v25.2.1-rc1"));
}

#[test]
fn test_drafts_are_ignored() {
    let releases = vec![
        release("v25.1.3", false),
        ReleaseInfo {
            tag: "v26.1.1".to_string(),
            prerelease: false,
            draft: true,
        },
    ];
    assert_eq!(select_latest(&releases).latest_stable.as_deref(), Some("v25.1.3"));
}

#[tokio::test]
async fn test_redpanda_beta_uses_unstable_repo() {
    let repo = FakeRepo {
        releases: vec![release("v25.1.3", false), release("v25.2.1-rc1", true)],
        ..Default::default()
    };

    let stable = redpanda_version(&repo, false).await.unwrap();
    assert_eq!(stable.version, "v25.1.3");
    assert_eq!(stable.docker_repo, "redpanda");

    let beta = redpanda_version(&repo, true).await.unwrap();
    assert_eq!(beta.version, "v25.2.1-rc1");
    assert_eq!(beta.docker_repo, "redpanda-unstable");
    assert!(beta.is_beta);
}

#[tokio::test]
async fn test_no_stable_release_is_an_error() {
    let repo = FakeRepo::default();
    assert!(redpanda_version(&repo, false).await.is_err());
}

#[test]
fn test_env_lines() {
    let version = ProductVersion {
        version: "v25.1.3".to_string(),
        docker_repo: "redpanda".to_string(),
        is_beta: false,
    };
    assert_eq!(
        version.to_env_lines("REDPANDA"),
        "REDPANDA_VERSION=v25.1.3\nREDPANDA_DOCKER_REPO=redpanda\n"
    );
}

#[test]
fn test_release_branch_for_tag() {
    assert_eq!(release_branch_for_tag("v25.1.3").as_deref(), Some("release/v25.1.x"));
    assert_eq!(release_branch_for_tag("v25.2.1-rc1").as_deref(), Some("release/v25.2.x"));
    assert_eq!(release_branch_for_tag("25.1.3"), None);
    assert_eq!(release_branch_for_tag("invalid-tag"), None);
}

#[tokio::test]
async fn test_helm_chart_versions_read_release_branches() {
    let repo = FakeRepo {
        charts: vec![
            ("release/v25.1.x".to_string(), "name: redpanda\nversion: 5.10.2\n".to_string()),
            ("release/v25.2.x".to_string(), "name: redpanda\nversion: 25.2.1-beta1\n".to_string()),
        ],
        ..Default::default()
    };

    let versions = helm_chart_versions(&repo, Some("v25.1.3"), Some("v25.2.1-rc1")).await;
    assert_eq!(versions.latest_stable_release.as_deref(), Some("5.10.2"));
    assert_eq!(versions.latest_beta_release.as_deref(), Some("25.2.1-beta1"));

    let mut requests = repo.requests.lock().unwrap().clone();
    requests.sort();
    assert_eq!(
        requests,
        vec![
            format!("release/v25.1.x:{CHART_PATH}"),
            format!("release/v25.2.x:{CHART_PATH}"),
        ]
    );
}

#[tokio::test]
async fn test_invalid_tag_makes_no_requests() {
    let repo = FakeRepo::default();
    let versions = helm_chart_versions(&repo, Some("invalid-tag"), None).await;
    assert_eq!(versions.latest_stable_release, None);
    assert_eq!(versions.latest_beta_release, None);
    assert!(repo.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_branch_yields_null() {
    let repo = FakeRepo::default();
    let versions = helm_chart_versions(&repo, Some("v25.1.3"), None).await;
    assert_eq!(versions.latest_stable_release, None);
    assert_eq!(repo.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_stable_tag_still_looks_up_beta() {
    let repo = FakeRepo {
        charts: vec![("release/v25.2.x".to_string(), "name: redpanda\nversion: 25.2.1-beta1\n".to_string())],
        ..Default::default()
    };
    let versions = helm_chart_versions(&repo, Some("invalid-tag"), Some("v25.2.1-rc1")).await;
    assert_eq!(versions.latest_stable_release, None);
    assert_eq!(versions.latest_beta_release.as_deref(), Some("25.2.1-beta1"));
    assert_eq!(
        repo.requests.lock().unwrap().clone(),
        vec![format!("release/v25.2.x:{CHART_PATH}")]
    );
}
