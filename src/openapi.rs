//! Loading, bundling and validating OpenAPI documents.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde_json::{Map, Value, json};

use crate::error::{DocToolsError, Result};
use crate::proto::compare::HTTP_METHODS;

/// Read a YAML or JSON document, keeping object key order
pub fn load_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DocToolsError::not_found(
            format!("OpenAPI document {}", path.display()),
            "Check the spec path, or set API_DOCS_REPO_PATH to your api-docs checkout",
        ),
        _ => e.into(),
    })?;
    parse_document(&text, path.extension().and_then(|e| e.to_str()))
}

pub fn parse_document(text: &str, extension: Option<&str>) -> Result<Value> {
    match extension {
        Some("json") => Ok(serde_json::from_str(text)?),
        _ => Ok(serde_yaml::from_str(text)?),
    }
}

/// Title and version of a bundled document
#[derive(Debug, Clone)]
pub struct BundleInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

fn merge_object(target: &mut Map<String, Value>, source: &Map<String, Value>, context: &str) {
    for (key, value) in source {
        match target.get(key) {
            Some(existing) if existing != value => {
                tracing::warn!("Conflicting definitions for {}/{}, keeping the first", context, key);
            }
            Some(_) => {}
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Merge generated fragments into one OpenAPI 3.1 document with sorted paths
pub fn bundle_fragments(fragments: &[Value], info: &BundleInfo) -> Value {
    let mut paths: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    let mut components: Map<String, Value> = Map::new();
    let mut tags: Vec<Value> = Vec::new();
    let mut tag_names = HashSet::new();

    for fragment in fragments {
        if let Some(fragment_paths) = fragment.get("paths").and_then(Value::as_object) {
            for (path, item) in fragment_paths {
                let Some(item) = item.as_object() else {
                    continue;
                };
                let entry = paths.entry(path.clone()).or_default();
                merge_object(entry, item, path);
            }
        }

        if let Some(sections) = fragment.get("components").and_then(Value::as_object) {
            for (section, definitions) in sections {
                let Some(definitions) = definitions.as_object() else {
                    continue;
                };
                let target = components
                    .entry(section.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Some(target) = target.as_object_mut() {
                    merge_object(target, definitions, section);
                }
            }
        }

        for tag in fragment.get("tags").and_then(Value::as_array).into_iter().flatten() {
            if let Some(name) = tag.get("name").and_then(Value::as_str) {
                if tag_names.insert(name.to_string()) {
                    tags.push(tag.clone());
                }
            }
        }
    }

    let mut info_object = json!({ "title": info.title, "version": info.version });
    if let Some(description) = &info.description {
        info_object["description"] = Value::String(description.clone());
    }

    let mut sorted_components = Map::new();
    let mut section_names: Vec<_> = components.keys().cloned().collect();
    section_names.sort();
    for name in section_names {
        if let Some(Value::Object(defs)) = components.remove(&name) {
            let mut keys: Vec<_> = defs.keys().cloned().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                if let Some(value) = defs.get(&key) {
                    sorted.insert(key, value.clone());
                }
            }
            sorted_components.insert(name, Value::Object(sorted));
        }
    }

    let mut doc = json!({
        "openapi": "3.1.0",
        "info": info_object,
        "paths": paths.into_iter().map(|(k, v)| (k, Value::Object(v))).collect::<Map<_, _>>(),
        "components": sorted_components,
    });
    if !tags.is_empty() {
        doc["tags"] = Value::Array(tags);
    }
    doc
}

fn collect_refs<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "$ref" {
                    if let Some(target) = child.as_str() {
                        out.push(target);
                    }
                } else {
                    collect_refs(child, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        _ => {}
    }
}

/// Problems that make a bundle unpublishable; empty when valid
pub fn validate_bundle(doc: &Value) -> Vec<String> {
    let mut problems = Vec::new();

    if doc.get("openapi").and_then(Value::as_str).is_none() {
        problems.push("missing `openapi` version field".to_string());
    }
    for field in ["title", "version"] {
        if doc.pointer(&format!("/info/{field}")).and_then(Value::as_str).is_none() {
            problems.push(format!("missing info.{field}"));
        }
    }

    let paths = doc.get("paths").and_then(Value::as_object);
    match paths {
        None => problems.push("missing `paths` object".to_string()),
        Some(paths) if paths.is_empty() => problems.push("document has no paths".to_string()),
        Some(_) => {}
    }

    let mut seen_ids = HashSet::new();
    for (path, item) in paths.into_iter().flatten() {
        for method in HTTP_METHODS {
            let Some(operation) = item.get(method) else {
                continue;
            };
            let where_ = format!("{} {}", method.to_uppercase(), path);
            match operation.get("operationId").and_then(Value::as_str) {
                Some(id) if !id.trim().is_empty() => {
                    if !seen_ids.insert(id.to_string()) {
                        problems.push(format!("{where_}: duplicate operationId `{id}`"));
                    }
                }
                _ => problems.push(format!("{where_}: missing operationId")),
            }
            let has_responses = operation
                .get("responses")
                .and_then(Value::as_object)
                .is_some_and(|r| !r.is_empty());
            if !has_responses {
                problems.push(format!("{where_}: no responses defined"));
            }
        }
    }

    let mut refs = Vec::new();
    collect_refs(doc, &mut refs);
    let mut reported = HashSet::new();
    for target in refs {
        let Some(pointer) = target.strip_prefix('#') else {
            continue;
        };
        if doc.pointer(pointer).is_none() && reported.insert(target) {
            problems.push(format!("unresolved reference `{target}`"));
        }
    }

    problems
}

/// Fail with `OpenApiValidation` when `doc` has problems
pub fn ensure_valid(doc: &Value) -> Result<()> {
    let problems = validate_bundle(doc);
    if problems.is_empty() {
        return Ok(());
    }
    for problem in &problems {
        tracing::error!("OpenAPI validation: {}", problem);
    }
    Err(DocToolsError::OpenApiValidation(problems))
}
