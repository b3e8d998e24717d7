//! Guarded passthrough from the MCP server to the `doc-tools` CLI.

use serde_json::json;

use crate::error::{DocToolsError, GenerationReport, Result};
use crate::exec::{CommandSpec, run};

/// Shell metacharacters that are never accepted
pub const FORBIDDEN_CHARS: [char; 17] = [
    ';', '|', '&', '$', '`', '<', '>', '(', ')', '{', '}', '[', ']', '!', '*', '?', '~',
];

const ALLOWED_PUNCTUATION: [char; 9] = ['-', '_', '.', '/', '=', ':', ',', '@', '+'];

/// Subcommands that would not terminate when run as a passthrough
const BLOCKED_SUBCOMMANDS: [&str; 1] = ["mcp"];

/// Check a command string and split it into an argv.
///
/// A leading `doc-tools` token is dropped, so both `doc-tools generate
/// rpk-docs` and `generate rpk-docs` are accepted.
pub fn validate_doc_tools_command(command: &str) -> Result<Vec<String>> {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return Err(DocToolsError::Validation("command is empty".to_string()));
    }
    if let Some(c) = trimmed.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(DocToolsError::Validation(format!(
            "command contains disallowed character `{c}`"
        )));
    }
    if trimmed.contains("..") {
        return Err(DocToolsError::Validation(
            "command contains a path traversal sequence `..`".to_string(),
        ));
    }
    if let Some(c) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == ' ' || ALLOWED_PUNCTUATION.contains(c)))
    {
        return Err(DocToolsError::Validation(format!(
            "command contains unsupported character {c:?}"
        )));
    }

    let mut argv: Vec<String> = trimmed.split(' ').filter(|s| !s.is_empty()).map(str::to_string).collect();
    if argv.first().is_some_and(|first| first == "doc-tools") {
        argv.remove(0);
    }
    match argv.first() {
        None => Err(DocToolsError::Validation("no subcommand given".to_string())),
        Some(first) if BLOCKED_SUBCOMMANDS.contains(&first.as_str()) => Err(DocToolsError::Validation(
            format!("`{first}` cannot be run through the passthrough"),
        )),
        Some(_) => Ok(argv),
    }
}

/// Re-invoke this executable with a validated argv
pub async fn run_doc_tools_command(command: &str) -> Result<GenerationReport> {
    let argv = validate_doc_tools_command(command)?;
    let exe = std::env::current_exe()?;
    tracing::info!("Passthrough: doc-tools {}", argv.join(" "));

    let output = run(CommandSpec::new(exe.to_string_lossy()).args(&argv)).await?;
    Ok(GenerationReport::with_data(json!({
        "argv": argv,
        "stdout": output.stdout,
        "stderr": output.stderr,
    })))
}
