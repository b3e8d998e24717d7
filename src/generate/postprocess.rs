//! Text cleanups applied to generated Markdown and AsciiDoc.

use regex::Regex;

use crate::error::Result;

/// Collapse runs of blank lines into one and trim trailing whitespace
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

/// Remove badge images and the helm-docs footer from a chart README
pub fn clean_helm_markdown(markdown: &str) -> Result<String> {
    let badge = Regex::new(r"(?m)^\s*!\[[^\]]*\]\(https://img\.shields\.io/[^)]*\)\s*$")?;
    let inline_badges = Regex::new(r"!\[[^\]]*\]\(https://img\.shields\.io/[^)]*\)\s*")?;
    let footer = Regex::new(r"(?m)^-{3,}\s*\n+Autogenerated from chart metadata using.*$")?;

    let text = badge.replace_all(markdown, "");
    let text = inline_badges.replace_all(&text, "");
    let text = footer.replace_all(&text, "");
    Ok(collapse_blank_lines(&text))
}

/// Escape `{name}` so Asciidoctor does not read it as an attribute reference.
///
/// Content inside `----` listing blocks is left alone.
pub fn escape_attribute_refs(adoc: &str) -> Result<String> {
    let attr = Regex::new(r"\{[A-Za-z0-9_][A-Za-z0-9_-]*\}")?;
    let mut out = String::with_capacity(adoc.len());
    let mut in_listing = false;
    for line in adoc.lines() {
        if line.trim() == "----" {
            in_listing = !in_listing;
        }
        let mut last = 0;
        if !in_listing {
            for found in attr.find_iter(line) {
                if line[..found.start()].ends_with('\\') {
                    continue;
                }
                out.push_str(&line[last..found.start()]);
                out.push('\\');
                last = found.start();
            }
        }
        out.push_str(&line[last..]);
        out.push('\n');
    }
    Ok(out)
}

/// Give untyped `----` listing blocks a language so they get highlighted
pub fn tag_listing_blocks(adoc: &str, language: &str) -> String {
    let mut out = String::with_capacity(adoc.len());
    let mut in_listing = false;
    let mut previous = "";
    for line in adoc.lines() {
        if line.trim() == "----" {
            if !in_listing && !previous.trim_start().starts_with('[') {
                out.push_str(&format!("[,{language}]\n"));
            }
            in_listing = !in_listing;
        }
        out.push_str(line);
        out.push('\n');
        previous = line;
    }
    out
}

/// Tidy pandoc's gfm-to-AsciiDoc output
pub fn clean_pandoc_asciidoc(adoc: &str) -> Result<String> {
    // pandoc emits explicit anchors that duplicate the auto-generated ones
    let anchors = Regex::new(r"(?m)^\[#[^\]]+\]\s*$\n?")?;
    let text = anchors.replace_all(adoc, "");
    let text = tag_listing_blocks(&text, "yaml");
    let text = escape_attribute_refs(&text)?;
    Ok(collapse_blank_lines(&text))
}

/// Prepend a document title and `:description:` header
pub fn with_page_header(title: &str, description: &str, body: &str) -> String {
    let body = body.trim_start();
    // Drop a level-0 title already present in the body
    let body = match body.strip_prefix("= ") {
        Some(rest) => rest.split_once('\n').map(|(_, tail)| tail).unwrap_or(""),
        None => body,
    };
    format!("= {title}\n:description: {description}\n\n{}", body.trim_start())
}

/// Escape a value for use inside an AsciiDoc table cell
pub fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
