//! The closed set of tools and their typed invocations.
//!
//! Every tool name maps to exactly one [`ToolName`] variant and every call
//! is parsed into a [`ToolInvocation`] before anything runs. Execution goes
//! through the single match in [`ToolInvocation::execute`].

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use rmcp::schemars;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{DocToolsError, GenerationReport, Result, ToolOutcome};
use crate::generate::bundle_openapi::{BundleOptions, bundle_openapi};
use crate::generate::cloud_regions::{
    CloudRegionsOptions, DEFAULT_REGIONS_OWNER, DEFAULT_REGIONS_PATH, DEFAULT_REGIONS_REPO, RegionsFormat,
    RegionsSource, generate_cloud_regions,
};
use crate::generate::crd_spec::{CrdSpecOptions, generate_crd_spec};
use crate::generate::helm_spec::{HelmSpecOptions, generate_helm_spec};
use crate::generate::metrics_docs::{MetricsDocsOptions, generate_metrics_docs};
use crate::generate::property_docs::{PropertyDocsOptions, generate_property_docs};
use crate::generate::rpcn_connector_docs::{ConnectorDocsOptions, generate_rpcn_connector_docs};
use crate::generate::rpk_docs::{RpkDocsOptions, generate_rpk_docs};
use crate::github::GitHubConnector;
use crate::jobs::JobQueue;
use crate::proto::{CompareOptions, ReportFormat, Surface, compare_proto_descriptions};
use crate::{command, review, versions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GetRedpandaVersion,
    GetConsoleVersion,
    GetHelmChartVersions,
    GeneratePropertyDocs,
    GenerateMetricsDocs,
    GenerateRpkDocs,
    GenerateRpcnConnectorDocs,
    GenerateHelmDocs,
    GenerateCloudRegions,
    GenerateCrdDocs,
    BundleOpenapi,
    CompareProtoDescriptions,
    ReviewGeneratedDocs,
    RunDocToolsCommand,
    GetJobStatus,
    ListJobs,
}

impl ToolName {
    pub const ALL: [ToolName; 16] = [
        ToolName::GetRedpandaVersion,
        ToolName::GetConsoleVersion,
        ToolName::GetHelmChartVersions,
        ToolName::GeneratePropertyDocs,
        ToolName::GenerateMetricsDocs,
        ToolName::GenerateRpkDocs,
        ToolName::GenerateRpcnConnectorDocs,
        ToolName::GenerateHelmDocs,
        ToolName::GenerateCloudRegions,
        ToolName::GenerateCrdDocs,
        ToolName::BundleOpenapi,
        ToolName::CompareProtoDescriptions,
        ToolName::ReviewGeneratedDocs,
        ToolName::RunDocToolsCommand,
        ToolName::GetJobStatus,
        ToolName::ListJobs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::GetRedpandaVersion => "get_redpanda_version",
            ToolName::GetConsoleVersion => "get_console_version",
            ToolName::GetHelmChartVersions => "get_helm_chart_versions",
            ToolName::GeneratePropertyDocs => "generate_property_docs",
            ToolName::GenerateMetricsDocs => "generate_metrics_docs",
            ToolName::GenerateRpkDocs => "generate_rpk_docs",
            ToolName::GenerateRpcnConnectorDocs => "generate_rpcn_connector_docs",
            ToolName::GenerateHelmDocs => "generate_helm_docs",
            ToolName::GenerateCloudRegions => "generate_cloud_regions",
            ToolName::GenerateCrdDocs => "generate_crd_docs",
            ToolName::BundleOpenapi => "bundle_openapi",
            ToolName::CompareProtoDescriptions => "compare_proto_descriptions",
            ToolName::ReviewGeneratedDocs => "review_generated_docs",
            ToolName::RunDocToolsCommand => "run_doc_tools_command",
            ToolName::GetJobStatus => "get_job_status",
            ToolName::ListJobs => "list_jobs",
        }
    }

    /// Tools that may run as background jobs
    pub fn supports_background(&self) -> bool {
        !matches!(
            self,
            ToolName::GetJobStatus | ToolName::ListJobs | ToolName::GetHelmChartVersions
        )
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self> {
        ToolName::ALL
            .iter()
            .find(|tool| tool.as_str() == s)
            .copied()
            .ok_or_else(|| DocToolsError::Validation(format!("unknown tool `{s}`")))
    }
}

/// Checked once at startup: names are unique, snake_case and parse back
pub fn validate_registry() -> Result<()> {
    let mut seen = HashSet::new();
    for tool in ToolName::ALL {
        let name = tool.as_str();
        let snake = name.starts_with(|c: char| c.is_ascii_lowercase())
            && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !snake {
            return Err(DocToolsError::Validation(format!("tool name `{name}` is not snake_case")));
        }
        if !seen.insert(name) {
            return Err(DocToolsError::Validation(format!("tool name `{name}` registered twice")));
        }
        if name.parse::<ToolName>()? != tool {
            return Err(DocToolsError::Validation(format!("tool name `{name}` resolves to another tool")));
        }
    }
    tracing::debug!("Registry holds {} tools", seen.len());
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct VersionRequest {
    #[schemars(description = "Return the latest beta release when it is newer than stable")]
    #[serde(default)]
    pub beta: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct HelmChartVersionsRequest {
    #[schemars(description = "Stable Redpanda Docker tag, for example v25.1.3")]
    #[serde(default)]
    pub stable_docker_tag: Option<String>,
    #[schemars(description = "Beta Redpanda Docker tag, for example v25.2.1-rc2")]
    #[serde(default)]
    pub beta_docker_tag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct PropertyDocsRequest {
    #[schemars(description = "Redpanda tag or branch to extract properties from (default: dev)")]
    #[serde(default)]
    pub tag: Option<String>,
    #[schemars(description = "Property overrides JSON (default: docs-data/property-overrides.json)")]
    #[serde(default)]
    pub overrides: Option<String>,
    #[schemars(description = "Write AsciiDoc pages in addition to the JSON dump (default: true)")]
    #[serde(default)]
    pub generate_pages: Option<bool>,
    #[schemars(description = "Run as a background job and return a job id")]
    #[serde(default)]
    pub background: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct MetricsDocsRequest {
    #[schemars(description = "Public metrics endpoint of a running broker")]
    #[serde(default)]
    pub public_url: Option<String>,
    #[schemars(description = "Internal metrics endpoint of a running broker")]
    #[serde(default)]
    pub internal_url: Option<String>,
    #[schemars(description = "Version label recorded in the JSON dump")]
    #[serde(default)]
    pub tag: Option<String>,
    #[schemars(description = "Run as a background job and return a job id")]
    #[serde(default)]
    pub background: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct RpkDocsRequest {
    #[schemars(description = "rpk executable to document (default: rpk)")]
    #[serde(default)]
    pub rpk: Option<String>,
    #[schemars(description = "Maximum subcommand depth (default: 4)")]
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[schemars(description = "Run as a background job and return a job id")]
    #[serde(default)]
    pub background: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct ConnectorDocsRequest {
    #[schemars(description = "rpk or redpanda-connect executable (default: rpk)")]
    #[serde(default)]
    pub binary: Option<String>,
    #[schemars(description = "Connect version label, overriding the one reported by the binary")]
    #[serde(default)]
    pub version: Option<String>,
    #[schemars(description = "Previous connect-<version>.json dump to diff against")]
    #[serde(default)]
    pub previous: Option<String>,
    #[schemars(description = "Connector overrides JSON (default: docs-data/overrides.json)")]
    #[serde(default)]
    pub overrides: Option<String>,
    #[schemars(description = "Run as a background job and return a job id")]
    #[serde(default)]
    pub background: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct HelmDocsRequest {
    #[schemars(description = "Local directory containing Helm charts; the operator repository is cloned when omitted")]
    #[serde(default)]
    pub chart_dir: Option<String>,
    #[schemars(description = "Branch or tag to clone (default: main)")]
    #[serde(default)]
    pub reference: Option<String>,
    #[schemars(description = "Run as a background job and return a job id")]
    #[serde(default)]
    pub background: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct CloudRegionsRequest {
    #[schemars(description = "Output file for the rendered table")]
    pub output: String,
    #[schemars(description = "Output format: adoc or md (default: adoc)")]
    #[serde(default)]
    pub format: Option<String>,
    #[schemars(description = "Local regions YAML instead of the GitHub master data")]
    #[serde(default)]
    pub source_path: Option<String>,
    #[schemars(description = "Branch of the master-data repository (default: main)")]
    #[serde(default)]
    pub reference: Option<String>,
    #[schemars(description = "Custom minijinja template file")]
    #[serde(default)]
    pub template: Option<String>,
    #[schemars(description = "Only include regions offering this cluster type, for example dedicated or byoc")]
    #[serde(default)]
    pub tier: Option<String>,
    #[schemars(description = "Include regions not marked public")]
    #[serde(default)]
    pub include_private: Option<bool>,
    #[schemars(description = "Run as a background job and return a job id")]
    #[serde(default)]
    pub background: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct CrdDocsRequest {
    #[schemars(description = "Local operator checkout; cloned when omitted")]
    #[serde(default)]
    pub source_path: Option<String>,
    #[schemars(description = "Branch or tag to clone (default: main)")]
    #[serde(default)]
    pub reference: Option<String>,
    #[schemars(description = "crd-ref-docs configuration file")]
    #[serde(default)]
    pub config: Option<String>,
    #[schemars(description = "crd-ref-docs templates directory")]
    #[serde(default)]
    pub templates_dir: Option<String>,
    #[schemars(description = "Output file (default: modules/reference/pages/k-crd.adoc)")]
    #[serde(default)]
    pub output: Option<String>,
    #[schemars(description = "Run as a background job and return a job id")]
    #[serde(default)]
    pub background: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct BundleOpenapiRequest {
    #[schemars(description = "API surface: admin or controlplane")]
    pub surface: String,
    #[schemars(description = "Tag to build from, also used as the bundle version")]
    pub tag: String,
    #[schemars(description = "Local checkout of the proto repository")]
    #[serde(default)]
    pub repo: Option<String>,
    #[schemars(description = "Directory to write <surface>-api.yaml into")]
    #[serde(default)]
    pub output_dir: Option<String>,
    #[schemars(description = "Run as a background job and return a job id")]
    #[serde(default)]
    pub background: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct CompareProtoRequest {
    #[schemars(description = "API surface: admin or controlplane")]
    pub surface: String,
    #[schemars(description = "OpenAPI spec generated from the proto sources")]
    pub generated_spec: String,
    #[schemars(description = "Published spec to compare against (default: the api-docs repository copy)")]
    #[serde(default)]
    pub current_spec: Option<String>,
    #[schemars(description = "Proto repository used to locate RPCs and PREVIEW markers")]
    #[serde(default)]
    pub proto_repo: Option<String>,
    #[schemars(description = "Report format: json, detailed or report (default: report)")]
    #[serde(default)]
    pub format: Option<String>,
    #[schemars(description = "List proto commits since this git ref")]
    #[serde(default)]
    pub since_ref: Option<String>,
    #[schemars(description = "Keep differences for PREVIEW operations")]
    #[serde(default)]
    pub include_preview: Option<bool>,
    #[schemars(description = "Also write the report to this file")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct ReviewRequest {
    #[schemars(description = "Directory of generated documentation to review")]
    pub directory: String,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct RunCommandRequest {
    #[schemars(description = "doc-tools command line, for example `generate rpk-docs`")]
    pub command: String,
    #[schemars(description = "Run as a background job and return a job id")]
    #[serde(default)]
    pub background: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct JobStatusRequest {
    #[schemars(description = "Job id returned by a background call")]
    pub job_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct ListJobsRequest {}

/// A fully parsed tool call
#[derive(Debug, Clone)]
pub enum ToolInvocation {
    GetRedpandaVersion(VersionRequest),
    GetConsoleVersion(VersionRequest),
    GetHelmChartVersions(HelmChartVersionsRequest),
    GeneratePropertyDocs(PropertyDocsRequest),
    GenerateMetricsDocs(MetricsDocsRequest),
    GenerateRpkDocs(RpkDocsRequest),
    GenerateRpcnConnectorDocs(ConnectorDocsRequest),
    GenerateHelmDocs(HelmDocsRequest),
    GenerateCloudRegions(CloudRegionsRequest),
    GenerateCrdDocs(CrdDocsRequest),
    BundleOpenapi(BundleOpenapiRequest),
    CompareProtoDescriptions(CompareProtoRequest),
    ReviewGeneratedDocs(ReviewRequest),
    RunDocToolsCommand(RunCommandRequest),
    GetJobStatus(JobStatusRequest),
    ListJobs(ListJobsRequest),
}

/// Shared state every invocation runs against
#[derive(Clone)]
pub struct ToolContext {
    pub config: Arc<Config>,
    pub github: Arc<GitHubConnector>,
    pub jobs: JobQueue,
}

fn args<T: DeserializeOwned>(tool: ToolName, value: Value) -> Result<T> {
    let value = if value.is_null() { json!({}) } else { value };
    serde_json::from_value(value)
        .map_err(|e| DocToolsError::Validation(format!("invalid arguments for {tool}: {e}")))
}

fn path(value: &Option<String>) -> Option<PathBuf> {
    value.as_ref().map(PathBuf::from)
}

/// Resolve a caller-supplied relative path under the docs root
pub fn within_docs_root(docs_root: &Path, relative: &str) -> Result<PathBuf> {
    let relative = Path::new(relative);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(DocToolsError::Validation(format!(
            "path {:?} must be relative to the docs root and must not contain '..'",
            relative
        )));
    }
    Ok(docs_root.join(relative))
}

impl ToolInvocation {
    /// Parse a `(name, arguments)` pair as sent by a client
    pub fn parse(name: &str, arguments: Value) -> Result<Self> {
        let tool: ToolName = name.parse()?;
        Ok(match tool {
            ToolName::GetRedpandaVersion => Self::GetRedpandaVersion(args(tool, arguments)?),
            ToolName::GetConsoleVersion => Self::GetConsoleVersion(args(tool, arguments)?),
            ToolName::GetHelmChartVersions => Self::GetHelmChartVersions(args(tool, arguments)?),
            ToolName::GeneratePropertyDocs => Self::GeneratePropertyDocs(args(tool, arguments)?),
            ToolName::GenerateMetricsDocs => Self::GenerateMetricsDocs(args(tool, arguments)?),
            ToolName::GenerateRpkDocs => Self::GenerateRpkDocs(args(tool, arguments)?),
            ToolName::GenerateRpcnConnectorDocs => Self::GenerateRpcnConnectorDocs(args(tool, arguments)?),
            ToolName::GenerateHelmDocs => Self::GenerateHelmDocs(args(tool, arguments)?),
            ToolName::GenerateCloudRegions => Self::GenerateCloudRegions(args(tool, arguments)?),
            ToolName::GenerateCrdDocs => Self::GenerateCrdDocs(args(tool, arguments)?),
            ToolName::BundleOpenapi => Self::BundleOpenapi(args(tool, arguments)?),
            ToolName::CompareProtoDescriptions => Self::CompareProtoDescriptions(args(tool, arguments)?),
            ToolName::ReviewGeneratedDocs => Self::ReviewGeneratedDocs(args(tool, arguments)?),
            ToolName::RunDocToolsCommand => Self::RunDocToolsCommand(args(tool, arguments)?),
            ToolName::GetJobStatus => Self::GetJobStatus(args(tool, arguments)?),
            ToolName::ListJobs => Self::ListJobs(args(tool, arguments)?),
        })
    }

    pub fn tool(&self) -> ToolName {
        match self {
            Self::GetRedpandaVersion(_) => ToolName::GetRedpandaVersion,
            Self::GetConsoleVersion(_) => ToolName::GetConsoleVersion,
            Self::GetHelmChartVersions(_) => ToolName::GetHelmChartVersions,
            Self::GeneratePropertyDocs(_) => ToolName::GeneratePropertyDocs,
            Self::GenerateMetricsDocs(_) => ToolName::GenerateMetricsDocs,
            Self::GenerateRpkDocs(_) => ToolName::GenerateRpkDocs,
            Self::GenerateRpcnConnectorDocs(_) => ToolName::GenerateRpcnConnectorDocs,
            Self::GenerateHelmDocs(_) => ToolName::GenerateHelmDocs,
            Self::GenerateCloudRegions(_) => ToolName::GenerateCloudRegions,
            Self::GenerateCrdDocs(_) => ToolName::GenerateCrdDocs,
            Self::BundleOpenapi(_) => ToolName::BundleOpenapi,
            Self::CompareProtoDescriptions(_) => ToolName::CompareProtoDescriptions,
            Self::ReviewGeneratedDocs(_) => ToolName::ReviewGeneratedDocs,
            Self::RunDocToolsCommand(_) => ToolName::RunDocToolsCommand,
            Self::GetJobStatus(_) => ToolName::GetJobStatus,
            Self::ListJobs(_) => ToolName::ListJobs,
        }
    }

    /// Whether the caller asked for a background job
    pub fn wants_background(&self) -> bool {
        let requested = match self {
            Self::GeneratePropertyDocs(r) => r.background,
            Self::GenerateMetricsDocs(r) => r.background,
            Self::GenerateRpkDocs(r) => r.background,
            Self::GenerateRpcnConnectorDocs(r) => r.background,
            Self::GenerateHelmDocs(r) => r.background,
            Self::GenerateCloudRegions(r) => r.background,
            Self::GenerateCrdDocs(r) => r.background,
            Self::BundleOpenapi(r) => r.background,
            Self::RunDocToolsCommand(r) => r.background,
            _ => None,
        };
        requested.unwrap_or(false) && self.tool().supports_background()
    }

    /// Run the invocation to completion
    pub async fn execute(self, ctx: &ToolContext) -> ToolOutcome {
        let tool = self.tool();
        tracing::info!("Executing {}", tool);
        let outcome = ToolOutcome::from(self.run(ctx).await);
        if let Some(error) = &outcome.error {
            tracing::error!("{} failed: {}", tool, error);
        }
        outcome
    }

    async fn run(self, ctx: &ToolContext) -> Result<GenerationReport> {
        let config = ctx.config.as_ref();
        match self {
            Self::GetRedpandaVersion(req) => {
                let version = versions::redpanda_version(ctx.github.as_ref(), req.beta.unwrap_or(false)).await?;
                Ok(GenerationReport::with_data(json!({
                    "version": version,
                    "env": version.to_env_lines("REDPANDA"),
                })))
            }
            Self::GetConsoleVersion(req) => {
                let version = versions::console_version(ctx.github.as_ref(), req.beta.unwrap_or(false)).await?;
                Ok(GenerationReport::with_data(json!({
                    "version": version,
                    "env": version.to_env_lines("CONSOLE"),
                })))
            }
            Self::GetHelmChartVersions(req) => {
                let versions = versions::helm_chart_versions(
                    ctx.github.as_ref(),
                    req.stable_docker_tag.as_deref(),
                    req.beta_docker_tag.as_deref(),
                )
                .await;
                Ok(GenerationReport::with_data(serde_json::to_value(versions)?))
            }
            Self::GeneratePropertyDocs(req) => {
                let defaults = PropertyDocsOptions::default();
                let options = PropertyDocsOptions {
                    tag: req.tag.unwrap_or(defaults.tag),
                    overrides: path(&req.overrides),
                    generate_pages: req.generate_pages.unwrap_or(true),
                    ..defaults
                };
                generate_property_docs(config, &options).await
            }
            Self::GenerateMetricsDocs(req) => {
                let defaults = MetricsDocsOptions::default();
                let options = MetricsDocsOptions {
                    public_url: req.public_url.unwrap_or(defaults.public_url),
                    internal_url: req.internal_url.or(defaults.internal_url),
                    tag: req.tag,
                    ..defaults
                };
                generate_metrics_docs(config, &options).await
            }
            Self::GenerateRpkDocs(req) => {
                let defaults = RpkDocsOptions::default();
                let options = RpkDocsOptions {
                    rpk: req.rpk.unwrap_or(defaults.rpk),
                    max_depth: req.max_depth.unwrap_or(defaults.max_depth),
                    ..defaults
                };
                generate_rpk_docs(config, &options).await
            }
            Self::GenerateRpcnConnectorDocs(req) => {
                let defaults = ConnectorDocsOptions::default();
                let options = ConnectorDocsOptions {
                    binary: req.binary.unwrap_or(defaults.binary),
                    version: req.version,
                    previous: path(&req.previous),
                    overrides: path(&req.overrides),
                    ..defaults
                };
                generate_rpcn_connector_docs(config, &options).await
            }
            Self::GenerateHelmDocs(req) => {
                let defaults = HelmSpecOptions::default();
                let options = HelmSpecOptions {
                    chart_dir: path(&req.chart_dir),
                    reference: req.reference.unwrap_or(defaults.reference),
                    ..defaults
                };
                generate_helm_spec(config, &options).await
            }
            Self::GenerateCloudRegions(req) => {
                let format = match req.format.as_deref() {
                    None | Some("adoc") => RegionsFormat::Adoc,
                    Some("md") => RegionsFormat::Md,
                    Some(other) => {
                        return Err(DocToolsError::Validation(format!(
                            "unknown regions format `{other}`, expected adoc or md"
                        )));
                    }
                };
                let source = match &req.source_path {
                    Some(local) => RegionsSource::Local(PathBuf::from(local)),
                    None => RegionsSource::GitHub {
                        owner: DEFAULT_REGIONS_OWNER.to_string(),
                        repo: DEFAULT_REGIONS_REPO.to_string(),
                        path: DEFAULT_REGIONS_PATH.to_string(),
                        reference: req.reference.clone().unwrap_or_else(|| "main".to_string()),
                    },
                };
                let options = CloudRegionsOptions {
                    source,
                    output: within_docs_root(&config.docs_root, &req.output)?,
                    format,
                    template: path(&req.template),
                    tier: req.tier,
                    include_private: req.include_private.unwrap_or(false),
                };
                generate_cloud_regions(&options, Some(ctx.github.as_ref())).await
            }
            Self::GenerateCrdDocs(req) => {
                let defaults = CrdSpecOptions::default();
                let options = CrdSpecOptions {
                    source_path: path(&req.source_path),
                    reference: req.reference.unwrap_or(defaults.reference),
                    config: path(&req.config),
                    templates_dir: path(&req.templates_dir),
                    output: path(&req.output),
                    ..defaults
                };
                generate_crd_spec(config, &options).await
            }
            Self::BundleOpenapi(req) => {
                let options = BundleOptions {
                    repo: path(&req.repo),
                    output_dir: path(&req.output_dir),
                    ..BundleOptions::new(req.surface.parse::<Surface>()?, req.tag)
                };
                bundle_openapi(config, &options).await
            }
            Self::CompareProtoDescriptions(req) => {
                let surface: Surface = req.surface.parse()?;
                let current_spec = match (&req.current_spec, &config.api_docs_repo_path) {
                    (Some(spec), _) => PathBuf::from(spec),
                    (None, Some(api_docs)) => api_docs.join(surface.published_spec()),
                    (None, None) => {
                        return Err(DocToolsError::not_found(
                            "current spec",
                            "Pass current_spec or set API_DOCS_REPO_PATH",
                        ));
                    }
                };
                let format = match req.format.as_deref() {
                    Some(format) => format.parse::<ReportFormat>()?,
                    None => ReportFormat::default(),
                };
                let options = CompareOptions {
                    surface,
                    current_spec,
                    generated_spec: PathBuf::from(&req.generated_spec),
                    proto_repo: path(&req.proto_repo).or_else(|| surface.repo_path(config)),
                    format,
                    since_ref: req.since_ref,
                    include_preview: req.include_preview.unwrap_or(false),
                    output: path(&req.output),
                };
                compare_proto_descriptions(&options).await
            }
            Self::ReviewGeneratedDocs(req) => {
                review::review_generated_docs(&within_docs_root(&config.docs_root, &req.directory)?)
            }
            Self::RunDocToolsCommand(req) => command::run_doc_tools_command(&req.command).await,
            Self::GetJobStatus(req) => {
                let id = Uuid::parse_str(req.job_id.trim())
                    .map_err(|e| DocToolsError::Validation(format!("invalid job id: {e}")))?;
                let job = ctx.jobs.status(&id).await.ok_or_else(|| {
                    DocToolsError::not_found(
                        format!("job {id}"),
                        "Finished jobs are kept for one hour; use list_jobs to see known jobs",
                    )
                })?;
                Ok(GenerationReport::with_data(serde_json::to_value(job)?))
            }
            Self::ListJobs(_) => {
                let jobs = ctx.jobs.list().await;
                let mut report = GenerationReport::with_data(serde_json::to_value(&jobs)?);
                report.count("jobs", jobs.len());
                Ok(report)
            }
        }
    }

    /// Run inline, or queue and return the job id when asked to
    pub async fn dispatch(self, ctx: &ToolContext) -> ToolOutcome {
        if !self.wants_background() {
            return self.execute(ctx).await;
        }
        let tool = self.tool();
        let job_ctx = ctx.clone();
        let id = ctx
            .jobs
            .submit(tool.as_str(), async move { self.execute(&job_ctx).await })
            .await;
        ToolOutcome::from(Ok(GenerationReport::with_data(json!({
            "jobId": id,
            "status": "queued",
            "message": format!("{tool} is running in the background; poll get_job_status"),
        }))))
    }
}
