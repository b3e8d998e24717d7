use std::fmt::Write as _;
use std::str::FromStr;

use serde::Serialize;

use super::compare::{Difference, FormatIssue};
use crate::error::{DocToolsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    Json,
    /// Summary plus manual backport instructions
    Detailed,
    /// Summary only
    #[default]
    Report,
}

impl FromStr for ReportFormat {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "detailed" => Ok(Self::Detailed),
            "report" | "" => Ok(Self::Report),
            other => Err(DocToolsError::Validation(format!(
                "unknown report format `{other}`, expected json, detailed or report"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub surface: String,
    pub current_spec: String,
    pub generated_spec: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

/// A commit that has to be backported by hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualCommit {
    pub sha: String,
    pub subject: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub differences: &'a [Difference],
    pub format_issues: &'a [FormatIssue],
    pub metadata: &'a ReportMetadata,
    pub skipped: &'a [Difference],
    pub manual_commits: &'a [ManualCommit],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    metadata: &'a ReportMetadata,
    summary: Summary,
    differences: &'a [Difference],
    format_issues: &'a [FormatIssue],
    skipped_preview: &'a [Difference],
    manual_commits: &'a [ManualCommit],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    total_differences: usize,
    summary_changes: usize,
    description_changes: usize,
    with_proto_location: usize,
    format_issues: usize,
    skipped_preview: usize,
}

fn summarize(input: &ReportInput<'_>) -> Summary {
    Summary {
        total_differences: input.differences.len(),
        summary_changes: input.differences.iter().filter(|d| d.changes.summary).count(),
        description_changes: input.differences.iter().filter(|d| d.changes.description).count(),
        with_proto_location: input
            .differences
            .iter()
            .filter(|d| d.location.as_ref().is_some_and(|l| l.found))
            .count(),
        format_issues: input.format_issues.len(),
        skipped_preview: input.skipped.len(),
    }
}

/// Render a comparison. Output depends only on `input`.
pub fn format_report(input: &ReportInput<'_>, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => {
            let report = JsonReport {
                metadata: input.metadata,
                summary: summarize(input),
                differences: input.differences,
                format_issues: input.format_issues,
                skipped_preview: input.skipped,
                manual_commits: input.manual_commits,
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        ReportFormat::Report => Ok(summary_text(input)),
        ReportFormat::Detailed => {
            let mut out = summary_text(input);
            out.push_str(&backport_text(input));
            Ok(out)
        }
    }
}

fn mark(changed: bool) -> &'static str {
    if changed { "yes" } else { "" }
}

fn summary_text(input: &ReportInput<'_>) -> String {
    let summary = summarize(input);
    let meta = input.metadata;
    let mut out = String::new();

    let _ = writeln!(out, "# Proto description comparison: {}\n", meta.surface);
    let _ = writeln!(out, "- Current spec: `{}`", meta.current_spec);
    let _ = writeln!(out, "- Generated spec: `{}`", meta.generated_spec);
    if let Some(at) = &meta.generated_at {
        let _ = writeln!(out, "- Generated at: {at}");
    }
    out.push('\n');

    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "- Operations with differences: {}", summary.total_differences);
    let _ = writeln!(out, "- Summary changes: {}", summary.summary_changes);
    let _ = writeln!(out, "- Description changes: {}", summary.description_changes);
    let _ = writeln!(out, "- Located in proto sources: {}", summary.with_proto_location);
    let _ = writeln!(out, "- Whitespace-only format issues: {}", summary.format_issues);
    let _ = writeln!(out, "- Skipped PREVIEW operations: {}", summary.skipped_preview);
    out.push('\n');

    if input.differences.is_empty() {
        out.push_str("No description differences found.\n");
    } else {
        out.push_str("| Operation | Method | Path | Summary | Description |\n");
        out.push_str("|---|---|---|---|---|\n");
        for d in input.differences {
            let _ = writeln!(
                out,
                "| `{}` | {} | `{}` | {} | {} |",
                d.operation_id,
                d.method.to_uppercase(),
                d.path,
                mark(d.changes.summary),
                mark(d.changes.description)
            );
        }
    }

    if !input.skipped.is_empty() {
        let _ = writeln!(out, "\n## Skipped PREVIEW operations\n");
        for d in input.skipped {
            let _ = writeln!(out, "- `{}` ({} {})", d.operation_id, d.method.to_uppercase(), d.path);
        }
    }

    if !input.format_issues.is_empty() {
        let _ = writeln!(out, "\n## Format issues\n");
        for issue in input.format_issues {
            let _ = writeln!(out, "- `{}` {}: {}", issue.operation_id, issue.field, issue.issue);
        }
    }

    out
}

fn backport_text(input: &ReportInput<'_>) -> String {
    let mut out = String::new();
    if input.differences.is_empty() && input.manual_commits.is_empty() {
        return out;
    }

    let _ = writeln!(out, "\n## Manual backport instructions\n");
    for (idx, d) in input.differences.iter().enumerate() {
        let _ = writeln!(out, "### {}. `{}`\n", idx + 1, d.operation_id);
        if d.changes.summary {
            let _ = writeln!(out, "Summary (current): {}", d.current.summary.trim());
            let _ = writeln!(out, "Summary (generated): {}\n", d.generated.summary.trim());
        }
        if d.changes.description {
            let _ = writeln!(out, "Description (current):\n\n> {}\n", d.current.description.trim());
            let _ = writeln!(out, "Description (generated):\n\n> {}\n", d.generated.description.trim());
        }

        match &d.location {
            Some(location) if location.found => {
                let line = location
                    .description_line_number
                    .or(location.rpc_line_number)
                    .unwrap_or(1);
                let _ = writeln!(out, "1. Open `{}` at line {}.", location.proto_file, line);
                let _ = writeln!(
                    out,
                    "2. Update the rpc comment to match the published text above."
                );
                let _ = writeln!(out, "3. Regenerate the spec and rerun this comparison.\n");
                if let Some(current) = &location.current_proto_description {
                    let _ = writeln!(out, "Current proto comment: {current}\n");
                }
                if let Some(definition) = &location.rpc_definition {
                    let _ = writeln!(out, "```proto\n{definition}\n```\n");
                }
            }
            Some(location) => {
                let _ = writeln!(
                    out,
                    "Proto location not found: {}\n",
                    location.error.as_deref().unwrap_or("no match")
                );
            }
            None => {
                let _ = writeln!(out, "No proto location available; locate the rpc by hand.\n");
            }
        }
    }

    if !input.manual_commits.is_empty() {
        let _ = writeln!(out, "## Commits touching proto sources\n");
        out.push_str("```sh\n");
        for commit in input.manual_commits {
            let _ = writeln!(out, "git cherry-pick {}  # {}", commit.sha, commit.subject);
        }
        out.push_str("```\n");
    }

    out
}
