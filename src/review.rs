//! Quality checks over generated documentation.

use std::path::Path;

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{DocToolsError, GenerationReport, Result};

const REVIEWED_EXTENSIONS: [&str; 3] = ["adoc", "md", "json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Placeholder,
    TemplateMarker,
    EmptyDescription,
    MalformedXref,
    HeadingStructure,
    InvalidJson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::TemplateMarker | IssueKind::MalformedXref | IssueKind::InvalidJson => Severity::Error,
            IssueKind::Placeholder | IssueKind::EmptyDescription | IssueKind::HeadingStructure => {
                Severity::Warning
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewIssue {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

impl ReviewIssue {
    fn new(file: &str, line: Option<usize>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            line,
            kind,
            severity: kind.severity(),
            message: message.into(),
        }
    }
}

/// Line-oriented patterns shared by every file checked
struct Patterns {
    placeholder: Regex,
    template: Regex,
    xref_wellformed: Regex,
    adoc_description: Regex,
    adoc_heading: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Self {
            placeholder: Regex::new(r"(?i)\b(TODO|FIXME|TBD)\b|lorem ipsum|<placeholder>")?,
            template: Regex::new(r"\{\{|\}\}|\{%|%\}")?,
            xref_wellformed: Regex::new(r"^xref:[^\s\[\]]+\[[^\]]*\]")?,
            adoc_description: Regex::new(r"^:description:\s*$")?,
            adoc_heading: Regex::new(r"^(=+)\s+\S")?,
        })
    }
}

/// 100 minus 10 per error and 2 per warning, floored at zero
pub fn score(issues: &[ReviewIssue]) -> u32 {
    let penalty: u32 = issues
        .iter()
        .map(|i| match i.severity {
            Severity::Error => 10,
            Severity::Warning => 2,
        })
        .sum();
    100u32.saturating_sub(penalty)
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].matches('\n').count() + 1
}

fn check_lines(file: &str, content: &str, patterns: &Patterns, adoc: bool) -> Vec<ReviewIssue> {
    let mut issues = Vec::new();
    let mut in_listing = false;
    let mut last_level = 0usize;

    for (idx, line) in content.lines().enumerate() {
        let number = Some(idx + 1);
        if adoc && line.trim_end() == "----" {
            in_listing = !in_listing;
            continue;
        }
        if in_listing {
            continue;
        }

        if let Some(m) = patterns.placeholder.find(line) {
            issues.push(ReviewIssue::new(
                file,
                number,
                IssueKind::Placeholder,
                format!("placeholder text `{}`", m.as_str()),
            ));
        }
        if patterns.template.is_match(line) {
            issues.push(ReviewIssue::new(
                file,
                number,
                IssueKind::TemplateMarker,
                "unrendered template marker",
            ));
        }

        if !adoc {
            continue;
        }
        for (pos, _) in line.match_indices("xref:") {
            if !patterns.xref_wellformed.is_match(&line[pos..]) {
                issues.push(ReviewIssue::new(
                    file,
                    number,
                    IssueKind::MalformedXref,
                    "xref without a target and link text in brackets",
                ));
            }
        }
        if patterns.adoc_description.is_match(line) {
            issues.push(ReviewIssue::new(
                file,
                number,
                IssueKind::EmptyDescription,
                "empty :description: attribute",
            ));
        }
        if let Some(caps) = patterns.adoc_heading.captures(line) {
            let level = caps[1].len();
            if last_level > 0 && level > last_level + 1 {
                issues.push(ReviewIssue::new(
                    file,
                    number,
                    IssueKind::HeadingStructure,
                    format!("section level jumps from {last_level} to {level}"),
                ));
            }
            last_level = level;
        }
    }
    issues
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Heading problems in a Markdown document: several H1s, skipped levels
pub fn check_markdown_headings(file: &str, content: &str) -> Vec<ReviewIssue> {
    let mut issues = Vec::new();
    let mut previous = 0usize;
    let mut h1_count = 0usize;

    for (event, range) in Parser::new(content).into_offset_iter() {
        let Event::Start(Tag::Heading { level, .. }) = event else {
            continue;
        };
        let depth = heading_depth(level);
        let line = Some(line_of(content, range.start));
        if depth == 1 {
            h1_count += 1;
            if h1_count == 2 {
                issues.push(ReviewIssue::new(
                    file,
                    line,
                    IssueKind::HeadingStructure,
                    "more than one top-level heading",
                ));
            }
        }
        if previous > 0 && depth > previous + 1 {
            issues.push(ReviewIssue::new(
                file,
                line,
                IssueKind::HeadingStructure,
                format!("heading level jumps from {previous} to {depth}"),
            ));
        }
        previous = depth;
    }
    issues
}

fn collect_empty_descriptions(value: &Value, pointer: &mut String, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(key);
                let empty = match child {
                    Value::Null => true,
                    Value::String(s) => s.trim().is_empty(),
                    _ => false,
                };
                if key == "description" && empty {
                    found.push(pointer.clone());
                } else {
                    collect_empty_descriptions(child, pointer, found);
                }
                pointer.truncate(len);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&idx.to_string());
                collect_empty_descriptions(child, pointer, found);
                pointer.truncate(len);
            }
        }
        _ => {}
    }
}

fn check_json(file: &str, content: &str, patterns: &Patterns) -> Vec<ReviewIssue> {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            return vec![ReviewIssue::new(
                file,
                Some(e.line()),
                IssueKind::InvalidJson,
                format!("not valid JSON: {e}"),
            )];
        }
    };

    let mut pointers = Vec::new();
    collect_empty_descriptions(&value, &mut String::new(), &mut pointers);
    let mut issues: Vec<ReviewIssue> = pointers
        .into_iter()
        .map(|p| ReviewIssue::new(file, None, IssueKind::EmptyDescription, format!("empty description at {p}")))
        .collect();

    if patterns.template.is_match(content) {
        issues.push(ReviewIssue::new(
            file,
            None,
            IssueKind::TemplateMarker,
            "unrendered template marker",
        ));
    }
    issues
}

/// Issues found in one file's content; `extension` picks the checks
pub fn review_content(file: &str, content: &str, extension: &str) -> Result<Vec<ReviewIssue>> {
    let patterns = Patterns::new()?;
    Ok(match extension {
        "adoc" => check_lines(file, content, &patterns, true),
        "md" => {
            let mut issues = check_lines(file, content, &patterns, false);
            issues.extend(check_markdown_headings(file, content));
            issues
        }
        "json" => check_json(file, content, &patterns),
        _ => Vec::new(),
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub files_reviewed: usize,
    pub score: u32,
    pub issues: Vec<ReviewIssue>,
}

pub fn review_directory(dir: &Path) -> Result<ReviewSummary> {
    if !dir.is_dir() {
        return Err(DocToolsError::not_found(
            format!("directory {}", dir.display()),
            "Run a generator first, or pass the directory it wrote to",
        ));
    }

    let mut files_reviewed = 0;
    let mut issues = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let Some(ext) = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| REVIEWED_EXTENSIONS.contains(&e.as_str()))
        else {
            continue;
        };
        let label = path.strip_prefix(dir).unwrap_or(path).display().to_string();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Skipping unreadable file {:?}: {}", path, e);
                continue;
            }
        };
        files_reviewed += 1;
        issues.extend(review_content(&label, &content, &ext)?);
    }

    Ok(ReviewSummary {
        files_reviewed,
        score: score(&issues),
        issues,
    })
}

pub fn review_generated_docs(dir: &Path) -> Result<GenerationReport> {
    let summary = review_directory(dir)?;
    tracing::info!(
        "Reviewed {} files, {} issues, score {}",
        summary.files_reviewed,
        summary.issues.len(),
        summary.score
    );

    let errors = summary
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let mut report = GenerationReport::with_data(serde_json::to_value(&summary)?);
    report.count("files", summary.files_reviewed);
    report.count("issues", summary.issues.len());
    report.count("errors", errors);
    report.count("warnings", summary.issues.len() - errors);
    report.count("score", summary.score as usize);
    Ok(report)
}
