//! Reference-documentation generators.
//!
//! Each generator assembles a command line for an external tool, parses
//! what it prints or writes, and lays the result out as AsciiDoc or JSON
//! under the docs root. They all return a [`GenerationReport`].

pub mod bundle_openapi;
pub mod cloud_regions;
pub mod crd_spec;
pub mod helm_spec;
pub mod metrics_docs;
pub mod postprocess;
pub mod property_docs;
pub mod rpcn_connector_docs;
pub mod rpk_docs;

use std::path::Path;

use crate::error::{GenerationReport, Result};

/// Write `content` to `path`, creating parent directories, and record it
pub(crate) fn write_output(path: &Path, content: &str, report: &mut GenerationReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::info!("Wrote {:?}", path);
    report.file(path);
    Ok(())
}

/// Strip a leading `v` so tags and versions compare the same way
pub(crate) fn bare_version(tag: &str) -> &str {
    tag.trim().trim_start_matches('v')
}
