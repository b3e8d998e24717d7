//! Compare OpenAPI operation descriptions against the proto sources they
//! are generated from.
//!
//! Proto files are scanned with regexes and brace counting. This is a
//! best-effort heuristic, not a protobuf parser: anything it cannot match
//! is reported as "no location" rather than as an error.

pub mod compare;
pub mod locator;
pub mod preview;
pub mod report;
pub mod rpc;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{DocToolsError, GenerationReport, Result};
use crate::exec::{CommandSpec, run};
use crate::openapi::load_document;

pub use compare::{Difference, FormatIssue, SpecDiff, diff_specs};
pub use locator::find_proto_file;
pub use preview::{PreviewPartition, collect_preview_operations, filter_preview};
pub use report::{ManualCommit, ReportFormat, ReportInput, ReportMetadata, format_report};
pub use rpc::{ProtoLocation, find_rpc};

/// An API grouping that selects a set of proto files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Admin,
    #[value(name = "controlplane", alias = "control-plane")]
    #[serde(rename = "controlplane", alias = "control-plane")]
    ControlPlane,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Admin => "admin",
            Surface::ControlPlane => "controlplane",
        }
    }

    /// Local checkout of the repository holding this surface's protos
    pub fn repo_path(&self, config: &Config) -> Option<PathBuf> {
        match self {
            Surface::Admin => config.redpanda_repo_path.clone(),
            Surface::ControlPlane => config.cloudv2_repo_path.clone(),
        }
    }

    /// Location of the published spec inside the api-docs repository
    pub fn published_spec(&self) -> &'static str {
        match self {
            Surface::Admin => "admin/admin-v2.yaml",
            Surface::ControlPlane => "cloud-controlplane/cloud-controlplane.yaml",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Surface {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Surface::Admin),
            "controlplane" | "control-plane" | "cloud-controlplane" => Ok(Surface::ControlPlane),
            other => Err(DocToolsError::Validation(format!(
                "unknown API surface `{other}`, expected admin or controlplane"
            ))),
        }
    }
}

/// The service and RPC an `operationId` refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationRef {
    pub service: String,
    pub rpc: String,
}

impl OperationRef {
    /// Split an operationId into service and RPC.
    ///
    /// Dotted ids use their last two segments
    /// (`redpanda.core.admin.v2.BrokerService.GetBroker`); undotted ids are
    /// split at the first underscore (`BrokerService_GetBroker`).
    pub fn parse(operation_id: &str) -> Option<Self> {
        let segments: Vec<&str> = operation_id
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        match segments.as_slice() {
            [.., service, rpc] => Some(Self {
                service: service.to_string(),
                rpc: rpc.to_string(),
            }),
            [single] => {
                let (service, rpc) = single.split_once('_')?;
                if service.is_empty() || rpc.is_empty() {
                    return None;
                }
                Some(Self {
                    service: service.to_string(),
                    rpc: rpc.to_string(),
                })
            }
            [] => None,
        }
    }

    /// `<Service>_<Rpc>`, the key PREVIEW operations are tracked under
    pub fn preview_key(&self) -> String {
        format!("{}_{}", self.service, self.rpc)
    }
}

/// Inputs of one comparison run
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub surface: Surface,
    pub current_spec: PathBuf,
    pub generated_spec: PathBuf,
    pub proto_repo: Option<PathBuf>,
    pub format: ReportFormat,
    pub since_ref: Option<String>,
    pub include_preview: bool,
    pub output: Option<PathBuf>,
}

/// Commits that touched the surface's proto files since `since_ref`
pub async fn manual_commits(repo: &Path, surface: Surface, since_ref: &str) -> Result<Vec<ManualCommit>> {
    let search_root = locator::surface_protos(surface).search_root;
    let output = run(CommandSpec::new("git")
        .arg("-C")
        .arg(repo.as_os_str())
        .args(["log", "--no-merges", "--format=%H%x09%s"])
        .arg(format!("{since_ref}..HEAD"))
        .arg("--")
        .arg(search_root))
    .await?;

    Ok(output
        .stdout
        .lines()
        .filter_map(|line| {
            let (sha, subject) = line.split_once('\t')?;
            Some(ManualCommit {
                sha: sha.trim().to_string(),
                subject: subject.trim().to_string(),
            })
        })
        .collect())
}

/// Load, diff, enrich, filter and format in one go
pub async fn compare_proto_descriptions(options: &CompareOptions) -> Result<GenerationReport> {
    let current = load_document(&options.current_spec)?;
    let generated = load_document(&options.generated_spec)?;

    let resolver: Box<dyn compare::LocationResolver> = match &options.proto_repo {
        Some(root) => Box::new(compare::ProtoRepoResolver::new(root.clone(), options.surface)),
        None => {
            tracing::warn!("No proto repository configured, differences will lack locations");
            Box::new(compare::NoLocations)
        }
    };

    let diff = diff_specs(&current, &generated, resolver.as_ref());
    tracing::info!(
        "Found {} description differences and {} format issues",
        diff.differences.len(),
        diff.format_issues.len()
    );

    let partition = match (&options.proto_repo, options.include_preview) {
        (Some(root), false) => {
            let preview = collect_preview_operations(root, options.surface)?;
            filter_preview(diff.differences, &preview)
        }
        _ => PreviewPartition {
            filtered: diff.differences,
            skipped: Vec::new(),
        },
    };

    let commits = match (&options.proto_repo, &options.since_ref) {
        (Some(root), Some(since)) => manual_commits(root, options.surface, since).await?,
        _ => Vec::new(),
    };

    let metadata = ReportMetadata {
        surface: options.surface.to_string(),
        current_spec: options.current_spec.display().to_string(),
        generated_spec: options.generated_spec.display().to_string(),
        generated_at: Some(chrono::Utc::now().to_rfc3339()),
    };
    let input = ReportInput {
        differences: &partition.filtered,
        format_issues: &diff.format_issues,
        metadata: &metadata,
        skipped: &partition.skipped,
        manual_commits: &commits,
    };
    let text = format_report(&input, options.format)?;

    let mut report = GenerationReport::with_data(serde_json::Value::String(text.clone()));
    report.count("differences", partition.filtered.len());
    report.count("skippedPreview", partition.skipped.len());
    report.count("formatIssues", diff.format_issues.len());
    report.count("manualCommits", commits.len());

    if let Some(output) = &options.output {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, &text)?;
        report.file(output);
    }

    Ok(report)
}
