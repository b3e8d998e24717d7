use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocToolsError>;

#[derive(Error, Debug)]
pub enum DocToolsError {
    #[error("required tool `{tool}` is not installed")]
    MissingDependency { tool: String, install: String },

    #[error("{what} not found")]
    NotFound { what: String, suggestion: String },

    #[error("`{command}` exited with {code:?}: {stderr}")]
    Subprocess {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("`{command}` produced more than {limit} bytes of output")]
    OutputTooLarge { command: String, limit: usize },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("OpenAPI validation failed with {} problem(s)", .0.len())]
    OpenApiValidation(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub error: {0}")]
    GitHub(#[from] octocrab::Error),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DocToolsError {
    pub fn not_found(what: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            suggestion: suggestion.into(),
        }
    }

    /// A hint for the caller on how to recover
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MissingDependency { install, .. } => Some(install.clone()),
            Self::NotFound { suggestion, .. } => Some(suggestion.clone()),
            Self::Subprocess { .. } => {
                Some("Inspect the captured stderr above and rerun the command manually".to_string())
            }
            Self::Timeout { .. } => Some("The command exceeded the 10 minute limit".to_string()),
            Self::Validation(_) => Some("Check the command syntax and arguments".to_string()),
            Self::OpenApiValidation(_) => {
                Some("Fix the listed problems in the proto sources and regenerate".to_string())
            }
            Self::GitHub(_) => Some(
                "Set REDPANDA_GITHUB_TOKEN, GITHUB_TOKEN or GH_TOKEN to raise rate limits".to_string(),
            ),
            _ => None,
        }
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::OpenApiValidation(_) => 2,
            _ => 1,
        }
    }
}

/// Files written and counts parsed by one generation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub files: Vec<String>,
    pub counts: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl GenerationReport {
    pub fn with_data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn file(&mut self, path: impl AsRef<std::path::Path>) {
        self.files.push(path.as_ref().display().to_string());
    }

    pub fn count(&mut self, key: &str, value: usize) {
        self.counts.insert(key.to_string(), value);
    }
}

/// Uniform result shape returned by every tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl From<Result<GenerationReport>> for ToolOutcome {
    fn from(result: Result<GenerationReport>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                error: None,
                suggestion: None,
                files: report.files,
                counts: report.counts,
                data: report.data,
                exit_code: 0,
            },
            Err(err) => {
                let mut data = None;
                match &err {
                    DocToolsError::Subprocess { stdout, stderr, .. } => {
                        data = Some(serde_json::json!({ "stdout": stdout, "stderr": stderr }));
                    }
                    DocToolsError::OpenApiValidation(problems) => {
                        data = Some(serde_json::json!({ "problems": problems }));
                    }
                    _ => {}
                }
                Self {
                    success: false,
                    error: Some(err.to_string()),
                    suggestion: err.suggestion(),
                    files: Vec::new(),
                    counts: BTreeMap::new(),
                    data,
                    exit_code: err.exit_code(),
                }
            }
        }
    }
}

impl ToolOutcome {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!("{{\"success\":false,\"error\":\"failed to serialize outcome: {e}\"}}")
        })
    }
}
