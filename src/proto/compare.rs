use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use super::locator::find_proto_file;
use super::rpc::{ProtoLocation, find_rpc};
use super::{OperationRef, Surface};

pub const HTTP_METHODS: [&str; 8] = ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationText {
    pub summary: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeFlags {
    pub summary: bool,
    pub description: bool,
}

/// One operation whose text differs between the two documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Difference {
    pub path: String,
    pub method: String,
    pub operation_id: String,
    pub current: OperationText,
    pub generated: OperationText,
    pub changes: ChangeFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ProtoLocation>,
}

impl Difference {
    pub fn operation(&self) -> Option<OperationRef> {
        OperationRef::parse(&self.operation_id)
    }
}

/// A field that differs only in whitespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatIssue {
    pub path: String,
    pub method: String,
    pub operation_id: String,
    pub field: String,
    pub issue: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDiff {
    pub differences: Vec<Difference>,
    pub format_issues: Vec<FormatIssue>,
}

/// Collapse runs of whitespace into one space and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Looks up where an operation is defined in proto sources
pub trait LocationResolver: Send + Sync {
    fn locate(&self, operation: &OperationRef) -> Option<ProtoLocation>;
}

/// Resolver used when no proto checkout is available
pub struct NoLocations;

impl LocationResolver for NoLocations {
    fn locate(&self, _operation: &OperationRef) -> Option<ProtoLocation> {
        None
    }
}

/// Resolves operations against a local proto checkout
pub struct ProtoRepoResolver {
    root: PathBuf,
    surface: Surface,
}

impl ProtoRepoResolver {
    pub fn new(root: PathBuf, surface: Surface) -> Self {
        Self { root, surface }
    }
}

impl LocationResolver for ProtoRepoResolver {
    fn locate(&self, operation: &OperationRef) -> Option<ProtoLocation> {
        let file = find_proto_file(&self.root, self.surface, &operation.service)?;
        match find_rpc(&file, &operation.rpc) {
            Ok(location) => Some(location),
            Err(e) => {
                tracing::warn!("Could not scan {:?} for {}: {}", file, operation.rpc, e);
                None
            }
        }
    }
}

fn text_field<'a>(operation: &'a Value, field: &str) -> &'a str {
    operation.get(field).and_then(Value::as_str).unwrap_or("")
}

fn operation_text(operation: &Value) -> OperationText {
    OperationText {
        summary: text_field(operation, "summary").to_string(),
        description: text_field(operation, "description").to_string(),
    }
}

/// Compare every operation present in both documents.
///
/// Operations are visited in the key order of `current`. Diffing a
/// document against itself yields nothing.
pub fn diff_specs(current: &Value, generated: &Value, resolver: &dyn LocationResolver) -> SpecDiff {
    let mut diff = SpecDiff::default();

    let (Some(current_paths), Some(generated_paths)) = (
        current.get("paths").and_then(Value::as_object),
        generated.get("paths").and_then(Value::as_object),
    ) else {
        tracing::warn!("One of the documents has no `paths` object");
        return diff;
    };

    for (path, current_item) in current_paths {
        let Some(generated_item) = generated_paths.get(path) else {
            continue;
        };
        let Some(current_ops) = current_item.as_object() else {
            continue;
        };

        for (method, current_op) in current_ops {
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let Some(generated_op) = generated_item.get(method) else {
                continue;
            };

            let operation_id = [current_op, generated_op]
                .into_iter()
                .map(|op| text_field(op, "operationId").trim())
                .find(|id| !id.is_empty());
            let Some(operation_id) = operation_id else {
                continue;
            };

            let current_text = operation_text(current_op);
            let generated_text = operation_text(generated_op);

            let mut changes = ChangeFlags::default();
            for (field, before, after, flag) in [
                ("summary", &current_text.summary, &generated_text.summary, &mut changes.summary),
                (
                    "description",
                    &current_text.description,
                    &generated_text.description,
                    &mut changes.description,
                ),
            ] {
                if normalize_whitespace(before) != normalize_whitespace(after) {
                    *flag = true;
                } else if before != after {
                    diff.format_issues.push(FormatIssue {
                        path: path.clone(),
                        method: method.clone(),
                        operation_id: operation_id.to_string(),
                        field: field.to_string(),
                        issue: "whitespace-only difference".to_string(),
                    });
                }
            }

            if !changes.summary && !changes.description {
                continue;
            }

            let location = OperationRef::parse(operation_id).and_then(|op| resolver.locate(&op));

            diff.differences.push(Difference {
                path: path.clone(),
                method: method.clone(),
                operation_id: operation_id.to_string(),
                current: current_text,
                generated: generated_text,
                changes,
                location,
            });
        }
    }

    diff
}
