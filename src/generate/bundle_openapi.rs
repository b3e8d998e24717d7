//! Build a single OpenAPI document per API surface from proto sources.

use std::path::PathBuf;

use serde_json::Value;
use walkdir::WalkDir;

use super::{bare_version, write_output};
use crate::config::Config;
use crate::error::{DocToolsError, GenerationReport, Result};
use crate::exec::{CommandSpec, TempWorkspace, ensure_tool, local_or_clone, run};
use crate::openapi::{BundleInfo, bundle_fragments, ensure_valid, load_document};
use crate::proto::Surface;
use crate::proto::compare::HTTP_METHODS;
use crate::proto::locator::surface_protos;

#[derive(Debug, Clone)]
pub struct BundleOptions {
    pub surface: Surface,
    /// Tag to build from; also the bundle's `info.version`
    pub tag: String,
    /// Local checkout of the proto repository
    pub repo: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// `buf` generation template, relative to the repository
    pub buf_template: String,
}

impl BundleOptions {
    pub fn new(surface: Surface, tag: impl Into<String>) -> Self {
        Self {
            surface,
            tag: tag.into(),
            repo: None,
            output_dir: None,
            buf_template: "buf.gen.openapi.yaml".to_string(),
        }
    }
}

fn surface_title(surface: Surface) -> &'static str {
    match surface {
        Surface::Admin => "Redpanda Admin API",
        Surface::ControlPlane => "Redpanda Cloud Control Plane API",
    }
}

fn clone_url(surface: Surface) -> Option<&'static str> {
    match surface {
        Surface::Admin => Some("https://github.com/redpanda-data/redpanda.git"),
        // private repository, needs a local checkout
        Surface::ControlPlane => None,
    }
}

/// Fragment documents written by `buf generate`, in path order
pub fn load_fragments(dir: &std::path::Path) -> Result<Vec<Value>> {
    let mut fragments = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let is_spec = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "yaml" | "yml" | "json"));
        if is_spec {
            fragments.push(load_document(entry.path())?);
        }
    }
    Ok(fragments)
}

fn count_operations(doc: &Value) -> usize {
    doc.get("paths")
        .and_then(Value::as_object)
        .map(|paths| {
            paths
                .values()
                .map(|item| HTTP_METHODS.iter().filter(|m| item.get(**m).is_some()).count())
                .sum()
        })
        .unwrap_or(0)
}

pub async fn bundle_openapi(config: &Config, options: &BundleOptions) -> Result<GenerationReport> {
    ensure_tool("buf", "Install buf: https://buf.build/docs/installation")?;

    let scratch = TempWorkspace::new("bundle-openapi")?;
    let local = options.repo.clone().or_else(|| options.surface.repo_path(config));
    let repo = match (local, clone_url(options.surface)) {
        (Some(path), _) if path.is_dir() => path,
        (local, Some(url)) => local_or_clone(local.as_deref(), url, &options.tag, &scratch).await?,
        (_, None) => {
            return Err(DocToolsError::not_found(
                format!("{} proto repository", options.surface),
                "Set CLOUDV2_REPO_PATH to a local cloudv2 checkout",
            ));
        }
    };

    let generated = scratch.path().join("openapi");
    std::fs::create_dir_all(&generated)?;
    run(CommandSpec::new("buf")
        .args(["generate", "--template"])
        .arg(&options.buf_template)
        .arg("--output")
        .arg(generated.as_os_str())
        .arg("--path")
        .arg(surface_protos(options.surface).search_root)
        .cwd(&repo))
    .await?;

    let fragments = load_fragments(&generated)?;
    if fragments.is_empty() {
        return Err(DocToolsError::not_found(
            "OpenAPI fragments in buf output",
            "Check the buf template enables an OpenAPI plugin",
        ));
    }

    let doc = bundle_fragments(
        &fragments,
        &BundleInfo {
            title: surface_title(options.surface).to_string(),
            version: bare_version(&options.tag).to_string(),
            description: None,
        },
    );
    ensure_valid(&doc)?;

    let out_dir = options
        .output_dir
        .clone()
        .or_else(|| config.api_docs_repo_path.as_ref().map(|p| p.join(options.surface.as_str())))
        .unwrap_or_else(|| config.docs_root.join("modules/reference/attachments"));
    let mut report = GenerationReport::default();
    write_output(
        &out_dir.join(format!("{}-api.yaml", options.surface)),
        &serde_yaml::to_string(&doc)?,
        &mut report,
    )?;

    report.count("fragments", fragments.len());
    report.count(
        "paths",
        doc.get("paths").and_then(Value::as_object).map_or(0, |p| p.len()),
    );
    report.count("operations", count_operations(&doc));
    report.count(
        "schemas",
        doc.pointer("/components/schemas")
            .and_then(Value::as_object)
            .map_or(0, |s| s.len()),
    );
    Ok(report)
}
