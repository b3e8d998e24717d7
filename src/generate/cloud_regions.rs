//! Cloud region tables, rendered from the regions master-data YAML.

use std::collections::BTreeMap;
use std::path::PathBuf;

use minijinja::Environment;
use serde::{Deserialize, Serialize};

use super::write_output;
use crate::error::{DocToolsError, GenerationReport, Result};
use crate::github::RepoSource;

pub const DEFAULT_REGIONS_OWNER: &str = "redpanda-data";
pub const DEFAULT_REGIONS_REPO: &str = "cloudv2";
pub const DEFAULT_REGIONS_PATH: &str = "apps/master-data-reconciler/manifests/overlays/production/regions.yaml";

const ADOC_TEMPLATE: &str = r#"// This file is generated. Do not edit it by hand.
{% for group in groups %}
== {{ group.display_name }}

[cols="1m,2,1"]
|===
|Region |Location |Zones
{% for region in group.regions %}
|{{ region.name }} |{{ region.display_name }} |{{ region.zones | join(", ") }}
{%- endfor %}
|===
{% endfor %}"#;

const MD_TEMPLATE: &str = r#"<!-- This file is generated. Do not edit it by hand. -->
{% for group in groups %}
## {{ group.display_name }}

| Region | Location | Zones |
|---|---|---|
{% for region in group.regions -%}
| `{{ region.name }}` | {{ region.display_name }} | {{ region.zones | join(", ") }} |
{% endfor %}{% endfor %}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RegionsFormat {
    #[default]
    Adoc,
    Md,
}

#[derive(Debug, Clone)]
pub enum RegionsSource {
    Local(PathBuf),
    GitHub {
        owner: String,
        repo: String,
        path: String,
        reference: String,
    },
}

impl Default for RegionsSource {
    fn default() -> Self {
        RegionsSource::GitHub {
            owner: DEFAULT_REGIONS_OWNER.to_string(),
            repo: DEFAULT_REGIONS_REPO.to_string(),
            path: DEFAULT_REGIONS_PATH.to_string(),
            reference: "main".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CloudRegionsOptions {
    pub source: RegionsSource,
    pub output: PathBuf,
    pub format: RegionsFormat,
    pub template: Option<PathBuf>,
    /// Only keep regions offering this cluster type (`dedicated`, `byoc`, ...)
    pub tier: Option<String>,
    pub include_private: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    #[serde(alias = "displayName", default)]
    pub display_name: String,
    pub provider: String,
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(alias = "clusterTypes", default)]
    pub cluster_types: Vec<String>,
    #[serde(default = "default_public")]
    pub public: bool,
}

#[derive(Debug, Deserialize)]
struct RegionsFile {
    regions: Vec<Region>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderGroup {
    pub provider: String,
    pub display_name: String,
    pub regions: Vec<Region>,
}

fn provider_rank(provider: &str) -> (usize, String) {
    let lower = provider.to_ascii_lowercase();
    let rank = match lower.as_str() {
        "aws" => 0,
        "gcp" => 1,
        "azure" => 2,
        _ => 3,
    };
    (rank, lower)
}

fn provider_display_name(provider: &str) -> String {
    match provider.to_ascii_lowercase().as_str() {
        "aws" => "AWS".to_string(),
        "gcp" => "GCP".to_string(),
        "azure" => "Azure".to_string(),
        _ => provider.to_string(),
    }
}

pub fn parse_regions(yaml: &str) -> Result<Vec<Region>> {
    let file: RegionsFile = serde_yaml::from_str(yaml)?;
    Ok(file.regions)
}

/// Filter regions and group them by provider (AWS, GCP, Azure, then others), sorted by name
pub fn group_regions(regions: &[Region], tier: Option<&str>, include_private: bool) -> Vec<ProviderGroup> {
    let mut groups: BTreeMap<(usize, String), Vec<Region>> = BTreeMap::new();
    for region in regions {
        if !include_private && !region.public {
            continue;
        }
        if let Some(tier) = tier {
            if !region.cluster_types.iter().any(|t| t.eq_ignore_ascii_case(tier)) {
                continue;
            }
        }
        groups
            .entry(provider_rank(&region.provider))
            .or_default()
            .push(region.clone());
    }

    groups
        .into_iter()
        .map(|((_, provider), mut regions)| {
            regions.sort_by(|a, b| a.name.cmp(&b.name));
            ProviderGroup {
                display_name: provider_display_name(&provider),
                provider,
                regions,
            }
        })
        .collect()
}

/// Render grouped regions with `template`, or the built-in one for `format`
pub fn render_regions(groups: &[ProviderGroup], template: Option<&str>, format: RegionsFormat) -> Result<String> {
    let source = template.unwrap_or(match format {
        RegionsFormat::Adoc => ADOC_TEMPLATE,
        RegionsFormat::Md => MD_TEMPLATE,
    });
    let mut env = Environment::new();
    env.add_template("regions", source)?;
    let tmpl = env.get_template("regions")?;
    let rendered = tmpl.render(minijinja::context! { groups => groups })?;
    Ok(format!("{}\n", rendered.trim()))
}

async fn load_source(source: &RegionsSource, github: Option<&dyn RepoSource>) -> Result<String> {
    match source {
        RegionsSource::Local(path) => Ok(std::fs::read_to_string(path)?),
        RegionsSource::GitHub {
            owner,
            repo,
            path,
            reference,
        } => {
            let github = github.ok_or_else(|| {
                DocToolsError::not_found(
                    "GitHub client",
                    "Set REDPANDA_GITHUB_TOKEN to read the regions file from GitHub",
                )
            })?;
            github
                .file_at_ref(owner, repo, path, reference)
                .await
                .map_err(|e| {
                    DocToolsError::not_found(
                        format!("{owner}/{repo}/{path}@{reference} ({e})"),
                        "The regions repository is private; check the token has access",
                    )
                })
        }
    }
}

pub async fn generate_cloud_regions(
    options: &CloudRegionsOptions,
    github: Option<&dyn RepoSource>,
) -> Result<GenerationReport> {
    let yaml = load_source(&options.source, github).await?;
    let regions = parse_regions(&yaml)?;
    let groups = group_regions(&regions, options.tier.as_deref(), options.include_private);

    let template = match &options.template {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };
    let rendered = render_regions(&groups, template.as_deref(), options.format)?;

    let mut report = GenerationReport::default();
    write_output(&options.output, &rendered, &mut report)?;
    report.count("providers", groups.len());
    report.count("regions", groups.iter().map(|g| g.regions.len()).sum());
    Ok(report)
}
