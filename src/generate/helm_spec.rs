//! Helm chart value references via `helm-docs` and `pandoc`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use super::postprocess::{clean_helm_markdown, clean_pandoc_asciidoc, with_page_header};
use super::write_output;
use crate::config::Config;
use crate::error::{DocToolsError, GenerationReport, Result};
use crate::exec::{CommandSpec, TempWorkspace, ensure_tool, local_or_clone, run};

pub const OPERATOR_GIT_URL: &str = "https://github.com/redpanda-data/redpanda-operator.git";

#[derive(Debug, Clone)]
pub struct HelmSpecOptions {
    /// Local directory containing charts; cloned from `repo_url` when absent
    pub chart_dir: Option<PathBuf>,
    pub repo_url: String,
    pub reference: String,
    /// Charts directory inside the repository
    pub charts_subdir: String,
    pub output_dir: Option<PathBuf>,
}

impl Default for HelmSpecOptions {
    fn default() -> Self {
        Self {
            chart_dir: None,
            repo_url: OPERATOR_GIT_URL.to_string(),
            reference: "main".to_string(),
            charts_subdir: "charts".to_string(),
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartManifest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Directories under `root` that contain a `Chart.yaml`, with their manifests
pub fn discover_charts(root: &Path) -> Result<Vec<(PathBuf, ChartManifest)>> {
    let mut charts = Vec::new();
    for entry in WalkDir::new(root)
        .max_depth(3)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() == "Chart.yaml")
    {
        let manifest: ChartManifest = serde_yaml::from_str(&std::fs::read_to_string(entry.path())?)?;
        if let Some(dir) = entry.path().parent() {
            charts.push((dir.to_path_buf(), manifest));
        }
    }
    Ok(charts)
}

pub async fn generate_helm_spec(config: &Config, options: &HelmSpecOptions) -> Result<GenerationReport> {
    ensure_tool(
        "helm-docs",
        "Install helm-docs: https://github.com/norwoodj/helm-docs#installation",
    )?;
    ensure_tool("pandoc", "Install pandoc: https://pandoc.org/installing.html")?;

    let scratch = TempWorkspace::new("helm-spec")?;
    let charts_root = match &options.chart_dir {
        Some(dir) if dir.is_dir() => dir.clone(),
        Some(dir) => {
            return Err(DocToolsError::not_found(
                format!("chart directory {}", dir.display()),
                "Pass an existing directory, or omit it to clone the chart repository",
            ));
        }
        None => {
            let repo = local_or_clone(None, &options.repo_url, &options.reference, &scratch).await?;
            repo.join(&options.charts_subdir)
        }
    };

    let charts = discover_charts(&charts_root)?;
    if charts.is_empty() {
        return Err(DocToolsError::not_found(
            format!("Helm charts under {}", charts_root.display()),
            "Point --chart-dir at a directory containing Chart.yaml files",
        ));
    }

    run(CommandSpec::new("helm-docs")
        .arg("--chart-search-root")
        .arg(charts_root.as_os_str())
        .args(["--output-file", "README.md"]))
    .await?;

    let out_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| config.docs_root.join("modules/reference/pages"));
    let mut report = GenerationReport::default();

    for (dir, chart) in &charts {
        let readme = dir.join("README.md");
        let markdown = match std::fs::read_to_string(&readme) {
            Ok(markdown) => markdown,
            Err(e) => {
                tracing::warn!("helm-docs produced no README for {}: {}", chart.name, e);
                continue;
            }
        };

        let cleaned = scratch.path().join(format!("{}.md", chart.name));
        std::fs::write(&cleaned, clean_helm_markdown(&markdown)?)?;
        let converted = scratch.path().join(format!("{}.adoc", chart.name));
        run(CommandSpec::new("pandoc")
            .arg(cleaned.as_os_str())
            .args(["-f", "gfm", "-t", "asciidoc", "--wrap=none", "-o"])
            .arg(converted.as_os_str()))
        .await?;

        let body = clean_pandoc_asciidoc(&std::fs::read_to_string(&converted)?)?;
        let description = chart
            .description
            .clone()
            .unwrap_or_else(|| format!("Values reference for the {} Helm chart", chart.name));
        let page = with_page_header(&format!("{} Helm Chart Specification", chart.name), &description, &body);
        write_output(
            &out_dir.join(format!("k-{}-helm-spec.adoc", chart.name)),
            &page,
            &mut report,
        )?;
    }

    report.count("charts", report.files.len());
    Ok(report)
}
