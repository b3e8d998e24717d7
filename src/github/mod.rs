use anyhow::Result;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use octocrab::Octocrab;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tokio::time::{Duration, sleep};

use crate::cache::TtlCache;

/// A release as seen by the version logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag: String,
    pub prerelease: bool,
    pub draft: bool,
}

/// A file fetched from a repository
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
}

/// The slice of GitHub the version and region logic needs
#[async_trait]
pub trait RepoSource: Send + Sync {
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<ReleaseInfo>>;

    async fn file_at_ref(&self, owner: &str, repo: &str, path: &str, reference: &str) -> Result<String>;
}

/// GitHub repository connector that handles authentication and repository operations
#[derive(Clone)]
pub struct GitHubConnector {
    client: Arc<Octocrab>,
    // Shared TTL cache for file contents, keyed by owner/repo@ref:path
    file_cache: Arc<TtlCache<String, String>>,
    // Semaphore to limit concurrent requests to GitHub API
    request_semaphore: Arc<Semaphore>,
    // Counter for API requests to track rate limiting
    request_count: Arc<AtomicUsize>,
    // Maximum number of concurrent requests
    max_concurrent_requests: usize,
}

impl GitHubConnector {
    pub fn new(token: Option<&str>, file_cache: Arc<TtlCache<String, String>>) -> Result<Self> {
        let mut builder = Octocrab::builder();

        // Set personal access token if provided
        if let Some(token) = token {
            if token.trim().is_empty() {
                anyhow::bail!("Personal access token cannot be empty");
            }
            tracing::info!("Using personal access token for GitHub API");
            builder = builder.personal_token(token);
        } else {
            tracing::warn!("No GitHub token set, requests are subject to anonymous rate limits");
        }

        let client = builder.build()?;

        // Default to 5 concurrent requests to avoid rate limiting
        let max_concurrent_requests = 5;

        Ok(Self {
            client: Arc::new(client),
            file_cache,
            request_semaphore: Arc::new(Semaphore::new(max_concurrent_requests)),
            request_count: Arc::new(AtomicUsize::new(0)),
            max_concurrent_requests,
        })
    }

    /// Number of GitHub API requests issued so far
    pub fn requests_made(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get the contents of a file from the repository with retry logic
    pub async fn get_file_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: Option<&str>,
    ) -> Result<String> {
        let key = format!("{owner}/{repo}@{}:{path}", reference.unwrap_or("HEAD"));
        if let Some(content) = self.file_cache.get(&key) {
            return Ok(content);
        }

        // Acquire a permit from the semaphore to limit concurrent requests
        let _permit = self.request_semaphore.clone().acquire_owned().await?;

        // Implement retry logic with exponential backoff
        let max_retries = 3;
        let mut retry_count = 0;
        let mut delay = Duration::from_millis(100);

        loop {
            if retry_count > 0 {
                sleep(delay).await;
                delay *= 2;
            }

            self.request_count.fetch_add(1, Ordering::SeqCst);
            match self.fetch_file_content(owner, repo, path, reference).await {
                Ok(file_content) => {
                    self.file_cache.insert(key, file_content.clone());
                    return Ok(file_content);
                }
                Err(e) => {
                    retry_count += 1;
                    if retry_count >= max_retries {
                        return Err(e.context(format!(
                            "failed to fetch {owner}/{repo}/{path} after {max_retries} attempts"
                        )));
                    }
                    tracing::warn!("Retry {}/{} for file {}: {}", retry_count, max_retries, path, e);
                }
            }
        }
    }

    /// Helper method to fetch file content from GitHub
    async fn fetch_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: Option<&str>,
    ) -> Result<String> {
        let repos = self.client.repos(owner, repo);
        let mut request = repos.get_content().path(path);
        if let Some(reference) = reference {
            request = request.r#ref(reference);
        }
        let content = request.send().await?;

        if let Some(file) = content.items.first() {
            if let Some(content) = &file.content {
                let decoded = STANDARD.decode(content.replace('\n', ""))?;
                let file_content = String::from_utf8(decoded)?;
                return Ok(file_content);
            }
        }

        anyhow::bail!("File not found or empty")
    }

    /// List all files under `path` recursively and fetch their contents
    pub async fn list_files(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Vec<RemoteFile>> {
        // Use an iterative approach with a queue to avoid deep recursion
        let mut directories_to_process: Vec<String> = vec![path.to_string()];
        let mut file_items = Vec::new();

        while let Some(current_path) = directories_to_process.pop() {
            self.request_count.fetch_add(1, Ordering::SeqCst);
            let repos = self.client.repos(owner, repo);
            let mut request = repos.get_content().path(&current_path);
            if let Some(reference) = reference {
                request = request.r#ref(reference);
            }
            let content = match request.send().await {
                Ok(content) => content,
                Err(e) => {
                    tracing::error!("Failed to list directory {}: {}", current_path, e);
                    continue;
                }
            };

            for item in content.items {
                if item.r#type == "file" {
                    file_items.push(item.path);
                } else if item.r#type == "dir" {
                    directories_to_process.push(item.path);
                }
            }
        }

        let mut files = Vec::with_capacity(file_items.len());

        // Fetch in chunks so at most `max_concurrent_requests` are in flight
        for chunk in file_items.chunks(self.max_concurrent_requests) {
            let mut tasks = Vec::with_capacity(chunk.len());

            for item_path in chunk {
                let item_path = item_path.clone();
                let self_clone = self.clone();
                let owner = owner.to_string();
                let repo = repo.to_string();
                let reference = reference.map(str::to_string);

                tasks.push(tokio::spawn(async move {
                    match self_clone
                        .get_file_contents(&owner, &repo, &item_path, reference.as_deref())
                        .await
                    {
                        Ok(content) => Some(RemoteFile { path: item_path, content }),
                        Err(e) => {
                            tracing::error!("Failed to fetch file {}: {}", item_path, e);
                            None
                        }
                    }
                }));
            }

            for task in tasks {
                if let Ok(Some(file)) = task.await {
                    files.push(file);
                }
            }
        }

        Ok(files)
    }

    /// Download a file or a directory tree into `save_dir`.
    ///
    /// A single file is written as `filename` when given. Directory entries
    /// keep their paths relative to `remote_path`.
    pub async fn fetch_to_dir(
        &self,
        owner: &str,
        repo: &str,
        remote_path: &str,
        save_dir: &Path,
        filename: Option<&str>,
        reference: Option<&str>,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(save_dir)?;

        self.request_count.fetch_add(1, Ordering::SeqCst);
        let repos = self.client.repos(owner, repo);
        let mut request = repos.get_content().path(remote_path);
        if let Some(reference) = reference {
            request = request.r#ref(reference);
        }
        let listing = request.send().await?;

        let is_single_file = listing.items.len() == 1
            && listing.items[0].r#type == "file"
            && listing.items[0].path == remote_path.trim_matches('/');

        let mut written = Vec::new();
        if is_single_file {
            let item = &listing.items[0];
            let content = self.get_file_contents(owner, repo, &item.path, reference).await?;
            let target = save_dir.join(filename.unwrap_or(&item.name));
            std::fs::write(&target, content)?;
            tracing::info!("Saved {} to {:?}", item.path, target);
            written.push(target);
            return Ok(written);
        }

        let prefix = remote_path.trim_matches('/');
        for file in self.list_files(owner, repo, remote_path, reference).await? {
            let relative = file
                .path
                .strip_prefix(prefix)
                .unwrap_or(&file.path)
                .trim_start_matches('/');
            let target = save_dir.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, file.content)?;
            written.push(target);
        }
        tracing::info!("Saved {} files from {}/{}/{}", written.len(), owner, repo, remote_path);
        Ok(written)
    }
}

#[async_trait]
impl RepoSource for GitHubConnector {
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<ReleaseInfo>> {
        let _permit = self.request_semaphore.clone().acquire_owned().await?;
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let page = self
            .client
            .repos(owner, repo)
            .releases()
            .list()
            .per_page(100)
            .send()
            .await?;

        Ok(page
            .items
            .into_iter()
            .map(|release| ReleaseInfo {
                tag: release.tag_name,
                prerelease: release.prerelease,
                draft: release.draft,
            })
            .collect())
    }

    async fn file_at_ref(&self, owner: &str, repo: &str, path: &str, reference: &str) -> Result<String> {
        self.get_file_contents(owner, repo, path, Some(reference)).await
    }
}
