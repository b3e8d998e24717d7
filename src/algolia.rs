//! Incremental Algolia indexing of a built documentation site.
//!
//! Each HTML page becomes one record carrying a content hash. Records whose
//! hash did not change since the last run are left alone, records for pages
//! that disappeared are deleted.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, header};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{DocToolsError, GenerationReport, Result};

/// Algolia rejects records above 10 KB; keep the body text well under it
pub const MAX_CONTENT_BYTES: usize = 8000;

const BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgoliaRecord {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub url: String,
    pub title: String,
    pub headings: Vec<String>,
    pub content: String,
    pub hash: String,
}

/// What the index already holds for a record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExistingRecord {
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(default)]
    pub hash: Option<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| DocToolsError::Validation(format!("invalid selector `{css}`: {e:?}")))
}

fn joined_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn content_hash(title: &str, headings: &[String], content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    for heading in headings {
        hasher.update([0u8]);
        hasher.update(heading.as_bytes());
    }
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build the search record for one page; `None` when the page has no text
pub fn records_from_html(html: &str, url: &str) -> Result<Option<AlgoliaRecord>> {
    let doc = Html::parse_document(html);

    let title = [selector("article h1")?, selector("h1")?, selector("title")?]
        .iter()
        .find_map(|sel| doc.select(sel).next())
        .map(|el| joined_text(el.text()))
        .unwrap_or_default();

    let heading_sel = selector("article h2, article h3, main h2, main h3")?;
    let mut seen = BTreeSet::new();
    let headings: Vec<String> = doc
        .select(&heading_sel)
        .map(|el| joined_text(el.text()))
        .filter(|h| !h.is_empty() && seen.insert(h.clone()))
        .collect();

    let body_sel = selector("article p, article li, article td, main p, main li, main td")?;
    let mut content = joined_text(doc.select(&body_sel).flat_map(|el| el.text()));
    if content.is_empty() && title.is_empty() {
        return Ok(None);
    }
    if content.len() > MAX_CONTENT_BYTES {
        let mut cut = MAX_CONTENT_BYTES;
        while !content.is_char_boundary(cut) {
            cut -= 1;
        }
        content.truncate(cut);
    }

    Ok(Some(AlgoliaRecord {
        object_id: url.to_string(),
        url: url.to_string(),
        hash: content_hash(&title, &headings, &content),
        title,
        headings,
        content,
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub update: Vec<AlgoliaRecord>,
    pub delete: Vec<String>,
    pub skipped: usize,
}

/// New or changed records are updated, records missing from the site deleted
pub fn plan_sync(existing: &[ExistingRecord], fresh: Vec<AlgoliaRecord>) -> SyncPlan {
    let known: HashMap<&str, Option<&str>> = existing
        .iter()
        .map(|r| (r.object_id.as_str(), r.hash.as_deref()))
        .collect();
    let live: BTreeSet<String> = fresh.iter().map(|r| r.object_id.clone()).collect();

    let mut plan = SyncPlan::default();
    for record in fresh {
        match known.get(record.object_id.as_str()) {
            Some(Some(hash)) if *hash == record.hash => plan.skipped += 1,
            _ => plan.update.push(record),
        }
    }
    plan.delete = existing
        .iter()
        .filter(|r| !live.contains(&r.object_id))
        .map(|r| r.object_id.clone())
        .collect();
    plan
}

/// Minimal REST client for one index
pub struct AlgoliaClient {
    client: Client,
    app_id: String,
    index: String,
}

#[derive(Debug, Deserialize)]
struct BrowsePage {
    hits: Vec<ExistingRecord>,
    #[serde(default)]
    cursor: Option<String>,
}

impl AlgoliaClient {
    pub fn new(app_id: &str, api_key: &str, index: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let value = |v: &str| {
            header::HeaderValue::from_str(v)
                .map_err(|e| DocToolsError::Validation(format!("invalid Algolia credential: {e}")))
        };
        headers.insert("x-algolia-application-id", value(app_id)?);
        headers.insert("x-algolia-api-key", value(api_key)?);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            app_id: app_id.to_string(),
            index: index.to_string(),
        })
    }

    fn index_url(&self, host_suffix: &str, action: &str) -> String {
        format!(
            "https://{}{}.algolia.net/1/indexes/{}/{}",
            self.app_id, host_suffix, self.index, action
        )
    }

    /// Every record's id and hash, following browse cursors
    pub async fn browse_existing(&self) -> Result<Vec<ExistingRecord>> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut body = json!({ "attributesToRetrieve": ["objectID", "hash"] });
            if let Some(cursor) = &cursor {
                body["cursor"] = Value::String(cursor.clone());
            }
            let page: BrowsePage = self
                .client
                .post(self.index_url("-dsn", "browse"))
                .json(&body)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            records.extend(page.hits);
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        tracing::info!("Index {} holds {} records", self.index, records.len());
        Ok(records)
    }

    pub async fn apply(&self, plan: &SyncPlan) -> Result<()> {
        let mut requests: Vec<Value> = plan
            .update
            .iter()
            .map(|r| -> Result<Value> { Ok(json!({ "action": "updateObject", "body": serde_json::to_value(r)? })) })
            .collect::<Result<_>>()?;
        requests.extend(
            plan.delete
                .iter()
                .map(|id| json!({ "action": "deleteObject", "body": { "objectID": id } })),
        );

        for chunk in requests.chunks(BATCH_SIZE) {
            self.client
                .post(self.index_url("", "batch"))
                .json(&json!({ "requests": chunk }))
                .send()
                .await?
                .error_for_status()?;
            tracing::info!("Sent batch of {} operations to {}", chunk.len(), self.index);
        }
        Ok(())
    }
}

/// Records for every HTML page under `site_dir`, addressed under `base_url`
pub fn collect_site_records(site_dir: &Path, base_url: &str) -> Result<Vec<AlgoliaRecord>> {
    let base = base_url.trim_end_matches('/');
    let mut records = Vec::new();
    for entry in WalkDir::new(site_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("html") || entry.file_name() == "404.html" {
            continue;
        }
        let relative = path
            .strip_prefix(site_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let html = std::fs::read_to_string(path)?;
        if let Some(record) = records_from_html(&html, &format!("{base}/{relative}"))? {
            records.push(record);
        }
    }
    Ok(records)
}

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub site_dir: PathBuf,
    pub base_url: String,
    /// Compute the plan without sending it
    pub dry_run: bool,
}

pub async fn index_site(config: &Config, options: &IndexOptions) -> Result<GenerationReport> {
    if !options.site_dir.is_dir() {
        return Err(DocToolsError::not_found(
            format!("site directory {}", options.site_dir.display()),
            "Build the site with Antora before indexing it",
        ));
    }
    let fresh = collect_site_records(&options.site_dir, &options.base_url)?;
    let pages = fresh.len();

    let client = match config.algolia.credentials() {
        Some((app_id, api_key, index)) => Some(AlgoliaClient::new(app_id, api_key, index)?),
        None if options.dry_run => None,
        None => {
            return Err(DocToolsError::not_found(
                "Algolia credentials",
                "Set ALGOLIA_APP_ID, ALGOLIA_ADMIN_API_KEY and ALGOLIA_INDEX_NAME",
            ));
        }
    };

    let existing = match &client {
        Some(client) => client.browse_existing().await?,
        None => Vec::new(),
    };
    let plan = plan_sync(&existing, fresh);

    if let (Some(client), false) = (&client, options.dry_run) {
        client.apply(&plan).await?;
    }

    let mut report = GenerationReport::default();
    report.count("pages", pages);
    report.count("updated", plan.update.len());
    report.count("deleted", plan.delete.len());
    report.count("skipped", plan.skipped);
    Ok(report)
}
