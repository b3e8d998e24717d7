//! Helpers for Antora component descriptors and page sources.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{DocToolsError, Result};

/// Set attributes in an `antora.yml` document, touching only their lines.
///
/// Existing attributes keep their indentation and quoting style. Missing
/// attributes are appended as the first entries under `asciidoc.attributes`.
pub fn update_version_attributes(content: &str, updates: &[(&str, &str)]) -> Result<String> {
    let mut output = content.to_string();
    let mut missing = Vec::new();

    for (key, value) in updates {
        let re = Regex::new(&format!(r"(?m)^([ \t]*{}:[ \t]*)(.*?)[ \t]*$", regex::escape(key)))?;
        let Some(caps) = re.captures(&output) else {
            missing.push((*key, *value));
            continue;
        };
        let (Some(whole), Some(prefix), Some(old)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let quoted = match old.as_str().chars().next() {
            Some(q @ ('\'' | '"')) => format!("{q}{value}{q}"),
            _ => value.to_string(),
        };
        let replacement = format!("{}{}", prefix.as_str(), quoted);
        let range = whole.range();
        output.replace_range(range, &replacement);
        tracing::debug!("Updated {} to {}", key, value);
    }

    if missing.is_empty() {
        return Ok(output);
    }

    let attributes = Regex::new(r"(?m)^([ \t]*)attributes:[ \t]*$")?;
    let found = attributes
        .captures(&output)
        .and_then(|caps| Some((caps.get(0)?.end(), caps.get(1)?.as_str().to_string())));
    if let Some((at, indent)) = found {
        let child_indent = format!("{indent}  ");
        let mut block = String::new();
        for (key, value) in &missing {
            block.push('\n');
            block.push_str(&format!("{child_indent}{key}: '{value}'"));
        }
        output.insert_str(at, &block);
        return Ok(output);
    }

    let asciidoc = Regex::new(r"(?m)^asciidoc:[ \t]*$")?;
    let mut block = String::from("\n  attributes:");
    for (key, value) in &missing {
        block.push_str(&format!("\n    {key}: '{value}'"));
    }
    if let Some(at) = asciidoc.find(&output).map(|m| m.end()) {
        output.insert_str(at, &block);
    } else {
        if !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str("asciidoc:");
        output.push_str(&block);
        output.push('\n');
    }
    Ok(output)
}

/// Patch the `antora.yml` file at `path` in place
pub fn update_antora_file(path: &Path, updates: &[(&str, &str)]) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DocToolsError::not_found(
            format!("{}", path.display()),
            "Run the command from the root of an Antora content source",
        ),
        _ => e.into(),
    })?;
    let updated = update_version_attributes(&content, updates)?;
    if updated != content {
        std::fs::write(path, updated)?;
        tracing::info!("Updated {} attribute(s) in {:?}", updates.len(), path);
    }
    Ok(())
}

/// Whether the component version is flagged as a prerelease
pub fn read_prerelease(content: &str) -> Result<bool> {
    let doc: serde_yaml::Value = serde_yaml::from_str(content)?;
    Ok(match doc.get("prerelease") {
        Some(serde_yaml::Value::Bool(flag)) => *flag,
        Some(serde_yaml::Value::String(s)) => !s.is_empty() && s != "false",
        _ => false,
    })
}

/// Give a resource id without an explicit version the `current` version.
///
/// `ROOT:console:x.adoc` becomes `current@ROOT:console:x.adoc`; ids that
/// already name a version are returned unchanged.
pub fn normalize_resource_id(id: &str) -> String {
    let id = id.trim();
    if id.is_empty() || id.contains('@') {
        return id.to_string();
    }
    format!("current@{id}")
}

/// Expose `<root>/<subdir>/README.adoc` as the page `<target>` of the ROOT module
pub fn link_readme(root: &Path, subdir: &str, target: &str) -> Result<PathBuf> {
    if subdir.contains("..") || target.contains("..") {
        return Err(DocToolsError::Validation(
            "subdir and target must not contain '..'".to_string(),
        ));
    }
    let source = root.join(subdir).join("README.adoc");
    if !source.is_file() {
        return Err(DocToolsError::not_found(
            format!("{}", source.display()),
            "Check --subdir points at a directory with a README.adoc",
        ));
    }

    let pages = root.join("modules").join("ROOT").join("pages");
    let dest = pages.join(target);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if dest.symlink_metadata().is_ok() {
        std::fs::remove_file(&dest)?;
    }

    // modules/ROOT/pages plus any directories inside the target path
    let depth = 3 + Path::new(target).components().count().saturating_sub(1);
    let mut relative = PathBuf::new();
    for _ in 0..depth {
        relative.push("..");
    }
    relative.push(subdir);
    relative.push("README.adoc");

    #[cfg(unix)]
    std::os::unix::fs::symlink(&relative, &dest)?;
    #[cfg(not(unix))]
    std::fs::copy(&source, &dest)?;

    tracing::info!("Linked {:?} -> {:?}", dest, relative);
    Ok(dest)
}
