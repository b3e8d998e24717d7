//! Version lookups against GitHub releases and Helm charts.

use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::github::{ReleaseInfo, RepoSource};

pub const REDPANDA_OWNER: &str = "redpanda-data";
pub const REDPANDA_REPO: &str = "redpanda";
pub const CONSOLE_REPO: &str = "console";
pub const OPERATOR_REPO: &str = "redpanda-operator";
pub const CHART_PATH: &str = "charts/redpanda/Chart.yaml";

/// The newest stable and prerelease tags of a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestReleases {
    pub latest_stable: Option<String>,
    pub latest_beta: Option<String>,
}

fn parse_tag(tag: &str) -> Option<Version> {
    Version::parse(tag.trim_start_matches('v')).ok()
}

/// Pick the highest stable release and the highest prerelease newer than it
pub fn select_latest(releases: &[ReleaseInfo]) -> LatestReleases {
    let mut stable: Option<(Version, &str)> = None;
    let mut beta: Option<(Version, &str)> = None;

    for release in releases.iter().filter(|r| !r.draft) {
        let Some(version) = parse_tag(&release.tag) else {
            tracing::debug!("Skipping unparseable tag {}", release.tag);
            continue;
        };
        let slot = if release.prerelease || !version.pre.is_empty() {
            &mut beta
        } else {
            &mut stable
        };
        if slot.as_ref().is_none_or(|(current, _)| version > *current) {
            *slot = Some((version, release.tag.as_str()));
        }
    }

    let latest_beta = match (&stable, beta) {
        (Some((stable_version, _)), Some((beta_version, tag))) if beta_version > *stable_version => {
            Some(tag.to_string())
        }
        (None, Some((_, tag))) => Some(tag.to_string()),
        _ => None,
    };

    LatestReleases {
        latest_stable: stable.map(|(_, tag)| tag.to_string()),
        latest_beta,
    }
}

pub async fn latest_releases(source: &dyn RepoSource, owner: &str, repo: &str) -> Result<LatestReleases> {
    let releases = source.list_releases(owner, repo).await?;
    let latest = select_latest(&releases);
    tracing::info!(
        "Latest releases for {}/{}: stable={:?} beta={:?}",
        owner,
        repo,
        latest.latest_stable,
        latest.latest_beta
    );
    Ok(latest)
}

/// A resolved product version with the Docker repository that ships it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductVersion {
    pub version: String,
    pub docker_repo: String,
    pub is_beta: bool,
}

impl ProductVersion {
    /// Render as `KEY=value` lines for shell consumption
    pub fn to_env_lines(&self, prefix: &str) -> String {
        format!(
            "{prefix}_VERSION={}\n{prefix}_DOCKER_REPO={}\n",
            self.version, self.docker_repo
        )
    }
}

fn resolve(latest: LatestReleases, beta: bool, docker_repo: &str, what: &str) -> Result<ProductVersion> {
    if beta {
        if let Some(version) = latest.latest_beta {
            return Ok(ProductVersion {
                version,
                docker_repo: format!("{docker_repo}-unstable"),
                is_beta: true,
            });
        }
        tracing::info!("No beta release newer than stable for {}, using stable", what);
    }
    let version = latest.latest_stable.ok_or_else(|| {
        crate::error::DocToolsError::not_found(
            format!("stable {what} release"),
            "Check that the repository has published releases",
        )
    })?;
    Ok(ProductVersion {
        version,
        docker_repo: docker_repo.to_string(),
        is_beta: false,
    })
}

pub async fn redpanda_version(source: &dyn RepoSource, beta: bool) -> Result<ProductVersion> {
    let latest = latest_releases(source, REDPANDA_OWNER, REDPANDA_REPO).await?;
    resolve(latest, beta, "redpanda", "Redpanda")
}

pub async fn console_version(source: &dyn RepoSource, beta: bool) -> Result<ProductVersion> {
    let latest = latest_releases(source, REDPANDA_OWNER, CONSOLE_REPO).await?;
    resolve(latest, beta, "console", "Redpanda Console")
}

/// Map a Docker tag like `v25.1.3` to its release branch `release/v25.1.x`
pub fn release_branch_for_tag(tag: &str) -> Option<String> {
    let re = Regex::new(r"^v(\d+)\.(\d+)\.(\d+)(?:-[0-9A-Za-z.\-]+)?$").ok()?;
    let caps = re.captures(tag.trim())?;
    Some(format!("release/v{}.{}.x", &caps[1], &caps[2]))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmChartVersions {
    pub latest_stable_release: Option<String>,
    pub latest_beta_release: Option<String>,
}

#[derive(Deserialize)]
struct ChartManifest {
    version: String,
}

async fn chart_version_for_tag(source: &dyn RepoSource, tag: Option<&str>) -> Option<String> {
    let tag = tag?;
    let Some(branch) = release_branch_for_tag(tag) else {
        tracing::warn!("Docker tag {} does not look like vX.Y.Z, skipping chart lookup", tag);
        return None;
    };
    let manifest = match source
        .file_at_ref(REDPANDA_OWNER, OPERATOR_REPO, CHART_PATH, &branch)
        .await
    {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::warn!("Could not read {} on {}: {}", CHART_PATH, branch, e);
            return None;
        }
    };
    match serde_yaml::from_str::<ChartManifest>(&manifest) {
        Ok(chart) => Some(chart.version),
        Err(e) => {
            tracing::warn!("Malformed Chart.yaml on {}: {}", branch, e);
            None
        }
    }
}

/// Helm chart versions matching the given stable and beta Docker tags
pub async fn helm_chart_versions(
    source: &dyn RepoSource,
    stable_docker_tag: Option<&str>,
    beta_docker_tag: Option<&str>,
) -> HelmChartVersions {
    let (latest_stable_release, latest_beta_release) = tokio::join!(
        chart_version_for_tag(source, stable_docker_tag),
        chart_version_for_tag(source, beta_docker_tag),
    );
    HelmChartVersions {
        latest_stable_release,
        latest_beta_release,
    }
}
