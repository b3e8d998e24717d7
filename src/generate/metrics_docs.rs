//! Metrics reference, scraped from Prometheus exposition endpoints.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use serde::Serialize;

use super::postprocess::collapse_blank_lines;
use super::write_output;
use crate::config::Config;
use crate::error::{GenerationReport, Result};

pub const DEFAULT_PUBLIC_METRICS_URL: &str = "http://localhost:19644/public_metrics";
pub const DEFAULT_INTERNAL_METRICS_URL: &str = "http://localhost:19644/metrics";
pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct MetricsDocsOptions {
    pub public_url: String,
    pub internal_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    /// Version label recorded in the JSON dump
    pub tag: Option<String>,
    pub scrape_timeout: Duration,
}

impl Default for MetricsDocsOptions {
    fn default() -> Self {
        Self {
            public_url: DEFAULT_PUBLIC_METRICS_URL.to_string(),
            internal_url: Some(DEFAULT_INTERNAL_METRICS_URL.to_string()),
            output_dir: None,
            tag: None,
            scrape_timeout: DEFAULT_SCRAPE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub name: String,
    pub help: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub labels: BTreeSet<String>,
}

const HISTOGRAM_SUFFIXES: [&str; 3] = ["_bucket", "_sum", "_count"];
const IGNORED_LABELS: [&str; 2] = ["le", "quantile"];

/// Parse Prometheus text exposition into metrics, in first-seen order
pub fn parse_exposition(text: &str) -> Result<Vec<Metric>> {
    let help_re = Regex::new(r"^#\s*HELP\s+(\S+)\s?(.*)$")?;
    let type_re = Regex::new(r"^#\s*TYPE\s+(\S+)\s+(\S+)")?;
    let sample_re = Regex::new(r"^([A-Za-z_:][A-Za-z0-9_:]*)(?:\{(.*)\})?\s+\S+")?;
    let label_re = Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*""#)?;

    let mut metrics: Vec<Metric> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    fn slot<'a>(metrics: &'a mut Vec<Metric>, index: &mut HashMap<String, usize>, name: &str) -> &'a mut Metric {
        let idx = *index.entry(name.to_string()).or_insert_with(|| {
            metrics.push(Metric {
                name: name.to_string(),
                ..Metric::default()
            });
            metrics.len() - 1
        });
        &mut metrics[idx]
    }

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = help_re.captures(line) {
            slot(&mut metrics, &mut index, &caps[1]).help = caps[2].trim().to_string();
        } else if let Some(caps) = type_re.captures(line) {
            slot(&mut metrics, &mut index, &caps[1]).kind = caps[2].to_string();
        } else if line.starts_with('#') {
            continue;
        } else if let Some(caps) = sample_re.captures(line) {
            let sample = &caps[1];
            let name = if index.contains_key(sample) {
                sample.to_string()
            } else {
                HISTOGRAM_SUFFIXES
                    .iter()
                    .find_map(|suffix| sample.strip_suffix(suffix))
                    .filter(|base| index.contains_key(*base))
                    .unwrap_or(sample)
                    .to_string()
            };
            let metric = slot(&mut metrics, &mut index, &name);
            if let Some(labels) = caps.get(2) {
                for label in label_re.captures_iter(labels.as_str()) {
                    if !IGNORED_LABELS.contains(&&label[1]) {
                        metric.labels.insert(label[1].to_string());
                    }
                }
            }
        }
    }

    for metric in &mut metrics {
        if metric.kind.is_empty() {
            metric.kind = "untyped".to_string();
        }
    }
    Ok(metrics)
}

/// Render a metrics reference page
pub fn render_metrics(title: &str, metrics: &[Metric]) -> String {
    let mut sorted: Vec<&Metric> = metrics.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = String::new();
    let _ = writeln!(out, "= {title}");
    let _ = writeln!(out, ":description: {title}.\n");
    for metric in sorted {
        let _ = writeln!(out, "=== {}\n", metric.name);
        if !metric.help.is_empty() {
            let _ = writeln!(out, "{}\n", metric.help);
        }
        let _ = writeln!(out, "*Type*: {}\n", metric.kind);
        if !metric.labels.is_empty() {
            out.push_str("*Labels*:\n\n");
            for label in &metric.labels {
                let _ = writeln!(out, "- `{label}`");
            }
            out.push('\n');
        }
        out.push_str("---\n\n");
    }
    collapse_blank_lines(&out)
}

async fn scrape(client: &Client, url: &str) -> Result<String> {
    tracing::info!("Scraping metrics from {}", url);
    Ok(client.get(url).send().await?.error_for_status()?.text().await?)
}

pub async fn generate_metrics_docs(config: &Config, options: &MetricsDocsOptions) -> Result<GenerationReport> {
    let out_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| config.docs_root.join("modules/reference/pages"));
    let mut report = GenerationReport::default();
    let client = Client::builder().timeout(options.scrape_timeout).build()?;

    let public = parse_exposition(&scrape(&client, &options.public_url).await?)?;
    write_output(
        &out_dir.join("public-metrics-reference.adoc"),
        &render_metrics("Public Metrics", &public),
        &mut report,
    )?;
    report.count("publicMetrics", public.len());

    let internal = match &options.internal_url {
        Some(url) => {
            let internal = parse_exposition(&scrape(&client, url).await?)?;
            write_output(
                &out_dir.join("internal-metrics-reference.adoc"),
                &render_metrics("Internal Metrics", &internal),
                &mut report,
            )?;
            report.count("internalMetrics", internal.len());
            internal
        }
        None => Vec::new(),
    };

    let dump = serde_json::json!({
        "version": options.tag,
        "public": public,
        "internal": internal,
    });
    let name = match &options.tag {
        Some(tag) => format!("metrics-{tag}.json"),
        None => "metrics.json".to_string(),
    };
    write_output(
        &config.docs_data_dir().join(name),
        &serde_json::to_string_pretty(&dump)?,
        &mut report,
    )?;

    Ok(report)
}
