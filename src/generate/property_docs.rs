//! Configuration property reference, from the tree-sitter property extractor.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::postprocess::{collapse_blank_lines, table_cell};
use super::{bare_version, write_output};
use crate::config::Config;
use crate::error::{DocToolsError, GenerationReport, Result};
use crate::exec::{CommandSpec, TempWorkspace, ensure_tool, local_or_clone, run};

pub const REDPANDA_GIT_URL: &str = "https://github.com/redpanda-data/redpanda.git";

#[derive(Debug, Clone)]
pub struct PropertyDocsOptions {
    /// Redpanda tag or branch to extract from
    pub tag: String,
    /// Extractor executable
    pub extractor: String,
    pub output_dir: Option<PathBuf>,
    pub overrides: Option<PathBuf>,
    pub generate_pages: bool,
}

impl Default for PropertyDocsOptions {
    fn default() -> Self {
        Self {
            tag: "dev".to_string(),
            extractor: "property-extractor".to_string(),
            output_dir: None,
            overrides: None,
            generate_pages: true,
        }
    }
}

/// One configuration property as emitted by the extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub is_enterprise: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Property {
    fn is_documented(&self) -> bool {
        !self.is_deprecated && self.visibility.as_deref() != Some("deprecated")
    }

    /// Which reference page the property belongs on
    pub fn page(&self) -> &'static str {
        match self.config_scope.as_deref() {
            Some("broker") => "broker-properties",
            Some("topic") => "topic-properties",
            _ if self.name.starts_with("cloud_storage_") => "object-storage-properties",
            _ => "cluster-properties",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertySet {
    pub properties: BTreeMap<String, Property>,
}

/// Merge manual overrides into extracted properties.
///
/// `overrides` has the shape `{"properties": {"<name>": {...fields}}}`.
/// Returns how many properties were touched; unknown names are logged.
pub fn apply_overrides(set: &mut PropertySet, overrides: &Value) -> Result<usize> {
    let Some(entries) = overrides.get("properties").and_then(Value::as_object) else {
        return Ok(0);
    };

    let mut applied = 0;
    for (name, fields) in entries {
        let Some(property) = set.properties.get_mut(name) else {
            tracing::warn!("Override for unknown property {}", name);
            continue;
        };
        let Some(fields) = fields.as_object() else {
            continue;
        };
        let mut merged = serde_json::to_value(&*property)?;
        if let Some(target) = merged.as_object_mut() {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        *property = serde_json::from_value(merged)?;
        applied += 1;
    }
    Ok(applied)
}

fn format_default(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn page_title(page: &str) -> &'static str {
    match page {
        "broker-properties" => "Broker Configuration Properties",
        "topic-properties" => "Topic Configuration Properties",
        "object-storage-properties" => "Object Storage Properties",
        _ => "Cluster Configuration Properties",
    }
}

/// Render one reference page
pub fn render_page(page: &str, properties: &[&Property]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "= {}", page_title(page));
    let _ = writeln!(out, ":description: Reference of {}.\n", page_title(page).to_lowercase());
    let _ = writeln!(out, "// This page is generated. Edit docs-data/property-overrides.json instead.\n");

    for property in properties {
        let _ = writeln!(out, "=== {}\n", property.name);
        let description = property
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or("No description available.");
        let _ = writeln!(out, "{description}\n");
        if property.is_enterprise {
            let _ = writeln!(out, "ifndef::env-cloud[]\n*Enterprise license required*\nendif::[]\n");
        }
        out.push_str("[cols=\"1s,2a\"]\n|===\n");
        if let Some(kind) = &property.kind {
            let _ = writeln!(out, "| Type | `{}`", table_cell(kind));
        }
        if let Some(default) = &property.default {
            let _ = writeln!(out, "| Default | `{}`", table_cell(&format_default(default)));
        }
        if let Some(scope) = &property.config_scope {
            let _ = writeln!(out, "| Scope | {}", table_cell(scope));
        }
        out.push_str("|===\n\n");
        if let Some(example) = &property.example {
            let _ = writeln!(out, ".Example\n{}\n", example.trim());
        }
        out.push_str("---\n\n");
    }
    collapse_blank_lines(&out)
}

/// Group documented properties by page, sorted by name
pub fn group_by_page(set: &PropertySet) -> BTreeMap<&'static str, Vec<&Property>> {
    let mut pages: BTreeMap<&'static str, Vec<&Property>> = BTreeMap::new();
    for property in set.properties.values().filter(|p| p.is_documented()) {
        pages.entry(property.page()).or_default().push(property);
    }
    pages
}

pub async fn generate_property_docs(config: &Config, options: &PropertyDocsOptions) -> Result<GenerationReport> {
    ensure_tool(
        &options.extractor,
        "Build the tree-sitter property extractor and put it on PATH",
    )?;

    let scratch = TempWorkspace::new("property-docs")?;
    let repo = local_or_clone(
        config.redpanda_repo_path.as_deref(),
        REDPANDA_GIT_URL,
        &options.tag,
        &scratch,
    )
    .await?;

    let raw_output = scratch.path().join("properties.json");
    run(CommandSpec::new(&options.extractor)
        .arg("--path")
        .arg(repo.as_os_str())
        .arg("--output")
        .arg(raw_output.as_os_str()))
    .await?;

    let raw = std::fs::read_to_string(&raw_output).map_err(|_| {
        DocToolsError::not_found(
            "extractor output",
            "The property extractor did not write its JSON output",
        )
    })?;
    let mut set: PropertySet = serde_json::from_str(&raw)?;

    let overrides_path = options
        .overrides
        .clone()
        .unwrap_or_else(|| config.docs_data_dir().join("property-overrides.json"));
    let mut report = GenerationReport::default();
    if overrides_path.is_file() {
        let overrides: Value = serde_json::from_str(&std::fs::read_to_string(&overrides_path)?)?;
        let applied = apply_overrides(&mut set, &overrides)?;
        report.count("overrides", applied);
    } else {
        tracing::info!("No overrides file at {:?}", overrides_path);
    }

    let version = bare_version(&options.tag);
    let json_path = config
        .docs_data_dir()
        .join(format!("redpanda-properties-v{version}.json"));
    write_output(&json_path, &serde_json::to_string_pretty(&set)?, &mut report)?;

    report.count("total", set.properties.len());
    report.count(
        "deprecated",
        set.properties.values().filter(|p| !p.is_documented()).count(),
    );

    if options.generate_pages {
        let pages_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| config.docs_root.join("modules/reference/partials/properties"));
        for (page, properties) in group_by_page(&set) {
            let path = pages_dir.join(format!("{page}.adoc"));
            write_output(&path, &render_page(page, &properties), &mut report)?;
            report.count(page, properties.len());
        }
    }

    Ok(report)
}
