use std::path::Path;

use regex::Regex;
use serde::Serialize;

use crate::error::Result;

/// How far above an RPC to look for its leading comment
const LOOKBACK_LINES: usize = 20;

/// Where an RPC lives in a proto file. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtoLocation {
    pub found: bool,
    pub proto_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_proto_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Strip a trailing `//` comment so braces inside it are not counted
fn code_part(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn brace_delta(line: &str) -> i64 {
    let code = code_part(line);
    code.matches('{').count() as i64 - code.matches('}').count() as i64
}

/// Find `rpc` in proto source text
pub fn locate_rpc_in_text(text: &str, rpc: &str, proto_file: &str) -> Result<ProtoLocation> {
    let rpc_pattern = Regex::new(&format!(r"\brpc\s+{}\s*\(", regex::escape(rpc)))?;
    let lines: Vec<&str> = text.lines().collect();

    let Some(start) = lines.iter().position(|line| rpc_pattern.is_match(code_part(line))) else {
        return Ok(ProtoLocation {
            found: false,
            proto_file: proto_file.to_string(),
            rpc_line_number: None,
            description_line_number: None,
            rpc_definition: None,
            current_proto_description: None,
            error: Some(format!("rpc {rpc} not found in {proto_file}")),
        });
    };

    // Capture the definition until its braces balance, or until `;` for
    // body-less declarations.
    let mut definition = Vec::new();
    let mut depth = 0i64;
    let mut opened = false;
    for line in &lines[start..] {
        definition.push(*line);
        if code_part(line).contains('{') {
            opened = true;
        }
        depth += brace_delta(line);
        if opened && depth <= 0 {
            break;
        }
        if !opened && code_part(line).trim_end().ends_with(';') {
            break;
        }
    }

    // Walk upward over the contiguous comment block directly above the rpc
    let mut comment_start = None;
    for idx in (start.saturating_sub(LOOKBACK_LINES)..start).rev() {
        if lines[idx].trim_start().starts_with("//") {
            comment_start = Some(idx);
        } else {
            break;
        }
    }

    let (description_line, description) = match comment_start {
        Some(first) => {
            let text = lines[first..start]
                .iter()
                .map(|l| l.trim_start().trim_start_matches('/').trim())
                .collect::<Vec<_>>()
                .join(" ");
            (first + 1, Some(text.trim().to_string()))
        }
        None => option_description(&definition, start)?.unwrap_or((start + 1, None)),
    };

    Ok(ProtoLocation {
        found: true,
        proto_file: proto_file.to_string(),
        rpc_line_number: Some(start + 1),
        description_line_number: Some(description_line),
        rpc_definition: Some(definition.join("\n")),
        current_proto_description: description.filter(|d| !d.is_empty()),
        error: None,
    })
}

/// `description: "..."` inside an operation option of the rpc body
fn option_description(definition: &[&str], start: usize) -> Result<Option<(usize, Option<String>)>> {
    let pattern = Regex::new(r#"\bdescription\s*:\s*"((?:[^"\\]|\\.)*)""#)?;
    for (offset, line) in definition.iter().enumerate() {
        if let Some(caps) = pattern.captures(line) {
            let text = caps[1].replace("\\\"", "\"").replace("\\n", "\n");
            return Ok(Some((start + offset + 1, Some(text))));
        }
    }
    Ok(None)
}

/// Read `path` and locate `rpc` in it
pub fn find_rpc(path: &Path, rpc: &str) -> Result<ProtoLocation> {
    let text = std::fs::read_to_string(path)?;
    locate_rpc_in_text(&text, rpc, &path.display().to_string())
}
