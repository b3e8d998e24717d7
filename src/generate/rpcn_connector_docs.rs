//! Redpanda Connect connector catalog and release-to-release diff.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use super::postprocess::{collapse_blank_lines, table_cell};
use super::write_output;
use crate::config::Config;
use crate::error::{GenerationReport, Result};
use crate::exec::{CommandSpec, ensure_tool, run};

#[derive(Debug, Clone)]
pub struct ConnectorDocsOptions {
    /// `rpk` (runs `rpk connect list`) or a standalone `redpanda-connect`
    pub binary: String,
    /// Overrides the version reported by the binary
    pub version: Option<String>,
    /// Previous `connect-<version>.json` dump to diff against
    pub previous: Option<PathBuf>,
    pub pages_dir: Option<PathBuf>,
    /// Manual summary and status fixes (default: `docs-data/overrides.json`)
    pub overrides: Option<PathBuf>,
}

impl Default for ConnectorDocsOptions {
    fn default() -> Self {
        Self {
            binary: "rpk".to_string(),
            version: None,
            previous: None,
            pages_dir: None,
            overrides: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ConnectorEntry {
    pub kind: String,
    pub name: String,
    pub status: String,
    pub summary: String,
}

/// Every `{name, status, summary}` object listed under a top-level array
pub fn catalog(dump: &Value) -> Vec<ConnectorEntry> {
    let mut entries = Vec::new();
    let Some(sections) = dump.as_object() else {
        return entries;
    };
    for (kind, items) in sections {
        let Some(items) = items.as_array() else {
            continue;
        };
        for item in items {
            let Some(name) = item.get("name").and_then(Value::as_str) else {
                continue;
            };
            let text = |key: &str| item.get(key).and_then(Value::as_str).unwrap_or("").to_string();
            entries.push(ConnectorEntry {
                kind: kind.clone(),
                name: name.to_string(),
                status: match text("status") {
                    s if s.is_empty() => "stable".to_string(),
                    s => s,
                },
                summary: text("summary"),
            });
        }
    }
    entries.sort();
    entries
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub newly_deprecated: Vec<String>,
}

impl ConnectorDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.newly_deprecated.is_empty()
    }
}

/// Apply manual overrides to catalog entries.
///
/// Overrides mirror the dump layout, `{"inputs": [{"name": "kafka", "summary": "..."}]}`.
/// Only non-empty `summary` and `status` fields are taken. Returns how many
/// entries changed.
pub fn apply_overrides(entries: &mut [ConnectorEntry], overrides: &Value) -> usize {
    let Some(sections) = overrides.as_object() else {
        return 0;
    };
    let mut applied = 0;
    for (kind, items) in sections {
        for item in items.as_array().into_iter().flatten() {
            let Some(name) = item.get("name").and_then(Value::as_str) else {
                continue;
            };
            let Some(entry) = entries.iter_mut().find(|e| e.kind == *kind && e.name == name) else {
                tracing::warn!("Override for unknown connector {}/{}", kind, name);
                continue;
            };
            let field = |key: &str| {
                item.get(key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };
            let mut changed = false;
            if let Some(summary) = field("summary") {
                changed |= entry.summary != summary;
                entry.summary = summary;
            }
            if let Some(status) = field("status") {
                changed |= entry.status != status;
                entry.status = status;
            }
            if changed {
                applied += 1;
            }
        }
    }
    applied
}

/// Diff `current` against a previous raw dump.
///
/// `current` already carries the overrides, so they are applied to the
/// previous catalog too; an override alone never shows up as a change.
pub fn diff_against_previous(
    previous: &Value,
    current: &[ConnectorEntry],
    overrides: Option<&Value>,
) -> ConnectorDiff {
    let mut previous = catalog(previous);
    if let Some(overrides) = overrides {
        apply_overrides(&mut previous, overrides);
    }
    diff_catalogs(&previous, current)
}

/// What changed between two catalogs, keyed as `<kind>/<name>`
pub fn diff_catalogs(previous: &[ConnectorEntry], current: &[ConnectorEntry]) -> ConnectorDiff {
    let key = |e: &ConnectorEntry| format!("{}/{}", e.kind, e.name);
    let before: BTreeMap<String, &ConnectorEntry> = previous.iter().map(|e| (key(e), e)).collect();
    let after: BTreeMap<String, &ConnectorEntry> = current.iter().map(|e| (key(e), e)).collect();

    let before_keys: BTreeSet<&String> = before.keys().collect();
    let after_keys: BTreeSet<&String> = after.keys().collect();

    let newly_deprecated = after
        .iter()
        .filter(|(k, e)| {
            e.status == "deprecated" && before.get(*k).is_some_and(|old| old.status != "deprecated")
        })
        .map(|(k, _)| k.clone())
        .collect();

    ConnectorDiff {
        added: after_keys.difference(&before_keys).map(|k| (*k).clone()).collect(),
        removed: before_keys.difference(&after_keys).map(|k| (*k).clone()).collect(),
        newly_deprecated,
    }
}

/// Render the catalog page, one table per connector kind
pub fn render_catalog(version: &str, entries: &[ConnectorEntry]) -> String {
    let mut by_kind: BTreeMap<&str, Vec<&ConnectorEntry>> = BTreeMap::new();
    for entry in entries {
        by_kind.entry(entry.kind.as_str()).or_default().push(entry);
    }

    let mut out = String::new();
    let _ = writeln!(out, "= Connector Catalog");
    let _ = writeln!(out, ":description: Connectors available in Redpanda Connect {version}.\n");
    for (kind, entries) in by_kind {
        let _ = writeln!(out, "== {}\n", kind.replace(['_', '-'], " "));
        out.push_str("[cols=\"1m,1,3\"]\n|===\n|Name |Status |Summary\n\n");
        for entry in entries {
            let _ = writeln!(
                out,
                "|{} |{} |{}\n",
                entry.name,
                entry.status,
                table_cell(&entry.summary)
            );
        }
        out.push_str("|===\n\n");
    }
    collapse_blank_lines(&out)
}

pub async fn generate_rpcn_connector_docs(
    config: &Config,
    options: &ConnectorDocsOptions,
) -> Result<GenerationReport> {
    ensure_tool(
        &options.binary,
        "Install rpk with the connect plugin, or redpanda-connect",
    )?;

    let mut command = CommandSpec::new(&options.binary);
    if options.binary.ends_with("rpk") {
        command = command.arg("connect");
    }
    let output = run(command.args(["list", "--format", "json-full"])).await?;
    let dump: Value = serde_json::from_str(&output.stdout)?;

    let version = options
        .version
        .clone()
        .or_else(|| dump.get("version").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());
    let mut entries = catalog(&dump);

    let mut report = GenerationReport::default();
    let data_dir = config.docs_data_dir();

    let overrides_path = options
        .overrides
        .clone()
        .unwrap_or_else(|| data_dir.join("overrides.json"));
    let overrides: Option<Value> = if overrides_path.is_file() {
        Some(serde_json::from_str(&std::fs::read_to_string(&overrides_path)?)?)
    } else {
        None
    };
    if let Some(overrides) = &overrides {
        let applied = apply_overrides(&mut entries, overrides);
        tracing::info!("Applied {} connector overrides from {:?}", applied, overrides_path);
        report.count("overrides", applied);
    }
    write_output(
        &data_dir.join(format!("connect-{version}.json")),
        &serde_json::to_string_pretty(&dump)?,
        &mut report,
    )?;

    let pages_dir = options
        .pages_dir
        .clone()
        .unwrap_or_else(|| config.docs_root.join("modules/components/pages"));
    write_output(
        &pages_dir.join("connector-catalog.adoc"),
        &render_catalog(&version, &entries),
        &mut report,
    )?;
    report.count("connectors", entries.len());

    if let Some(previous_path) = &options.previous {
        let previous: Value = serde_json::from_str(&std::fs::read_to_string(previous_path)?)?;
        let previous_version = previous
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("previous")
            .to_string();
        let diff = diff_against_previous(&previous, &entries, overrides.as_ref());
        report.count("added", diff.added.len());
        report.count("removed", diff.removed.len());
        report.count("newlyDeprecated", diff.newly_deprecated.len());
        write_output(
            &data_dir.join(format!("connect-diff-{previous_version}_to_{version}.json")),
            &serde_json::to_string_pretty(&diff)?,
            &mut report,
        )?;
        report.data = Some(serde_json::to_value(&diff)?);
    }

    Ok(report)
}
