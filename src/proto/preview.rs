use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;

use super::compare::Difference;
use super::locator::proto_files;
use super::{OperationRef, Surface};
use crate::error::Result;

/// Restriction annotation marking unreleased API surface
pub const PREVIEW_ANNOTATION: &str = "RESTRICTION_PREVIEW";

fn code_part(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

struct OpenRpc {
    index: usize,
    opened_at: i64,
    body_seen: bool,
}

/// `<Service>_<Rpc>` keys of every PREVIEW rpc defined in `text`.
///
/// A service whose own options carry the annotation contributes all of its
/// rpcs; otherwise only rpcs whose bodies carry it are included. Signatures
/// may wrap across lines and opening braces may sit on the next line.
pub fn preview_operations_in_text(text: &str) -> Result<BTreeSet<String>> {
    let service_re = Regex::new(r"^\s*service\s+(\w+)\b")?;
    let rpc_re = Regex::new(r"^\s*rpc\s+(\w+)\s*\(")?;

    let mut keys = BTreeSet::new();
    let mut pending_service: Option<String> = None;
    let mut service: Option<String> = None;
    let mut service_marked = false;
    let mut service_depth = 0i64;
    // (rpc name, carries the annotation)
    let mut rpcs: Vec<(String, bool)> = Vec::new();
    let mut open_rpc: Option<OpenRpc> = None;
    let mut depth = 0i64;

    for line in text.lines() {
        let code = code_part(line);

        if service.is_none() && pending_service.is_none() {
            if let Some(caps) = service_re.captures(code) {
                pending_service = Some(caps[1].to_string());
            }
        } else if service.is_some() {
            if let Some(caps) = rpc_re.captures(code) {
                rpcs.push((caps[1].to_string(), false));
                open_rpc = Some(OpenRpc {
                    index: rpcs.len() - 1,
                    opened_at: depth,
                    body_seen: false,
                });
            }
        }

        if pending_service.is_some() && code.contains('{') {
            service = pending_service.take();
            service_marked = false;
            service_depth = depth;
            rpcs.clear();
        }

        if code.contains(PREVIEW_ANNOTATION) {
            match &open_rpc {
                Some(rpc) => rpcs[rpc.index].1 = true,
                None if service.is_some() => service_marked = true,
                None => {}
            }
        }

        depth += code.matches('{').count() as i64 - code.matches('}').count() as i64;

        if let Some(rpc) = open_rpc.as_mut() {
            if code.contains('{') {
                rpc.body_seen = true;
            }
            let closed = if rpc.body_seen {
                depth <= rpc.opened_at
            } else {
                code.trim_end().ends_with(';')
            };
            if closed {
                open_rpc = None;
            }
        }

        if service.is_some() && depth <= service_depth && code.contains('}') {
            if let Some(name) = service.take() {
                for (rpc, marked) in rpcs.drain(..) {
                    if service_marked || marked {
                        let key = OperationRef {
                            service: name.clone(),
                            rpc,
                        }
                        .preview_key();
                        keys.insert(key);
                    }
                }
            }
            open_rpc = None;
        }
    }

    Ok(keys)
}

/// Scan every proto file of `surface` for PREVIEW rpcs
pub fn collect_preview_operations(repo_root: &Path, surface: Surface) -> Result<BTreeSet<String>> {
    let mut keys = BTreeSet::new();
    for file in proto_files(repo_root, surface) {
        let text = match std::fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping unreadable proto {:?}: {}", file, e);
                continue;
            }
        };
        if !text.contains(PREVIEW_ANNOTATION) {
            continue;
        }
        let found = preview_operations_in_text(&text)?;
        tracing::debug!("{:?}: {} PREVIEW rpc(s)", file, found.len());
        keys.extend(found);
    }
    tracing::info!("Found {} PREVIEW operations for {}", keys.len(), surface);
    Ok(keys)
}

/// Differences split by whether their operation is PREVIEW
#[derive(Debug, Clone, Default)]
pub struct PreviewPartition {
    pub filtered: Vec<Difference>,
    pub skipped: Vec<Difference>,
}

/// Move every PREVIEW difference into `skipped`. Each input lands in exactly one side.
pub fn filter_preview(differences: Vec<Difference>, preview: &BTreeSet<String>) -> PreviewPartition {
    let (skipped, filtered) = differences.into_iter().partition(|difference| {
        difference
            .operation()
            .is_some_and(|op| preview.contains(&op.preview_key()))
    });
    PreviewPartition { filtered, skipped }
}
