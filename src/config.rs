use std::path::PathBuf;
use std::time::Duration;

/// How long a subprocess may run before it is killed
pub const SUBPROCESS_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Maximum bytes captured from each of stdout and stderr
pub const MAX_OUTPUT_BYTES: usize = 50 * 1024 * 1024;

/// Time-to-live for cached GitHub responses
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// How long finished background jobs stay queryable
pub const JOB_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Token variables, in order of precedence
pub const GITHUB_TOKEN_VARS: [&str; 3] = ["REDPANDA_GITHUB_TOKEN", "GITHUB_TOKEN", "GH_TOKEN"];

/// Algolia credentials
#[derive(Debug, Clone, Default)]
pub struct AlgoliaConfig {
    pub app_id: Option<String>,
    pub admin_api_key: Option<String>,
    pub index_name: Option<String>,
}

impl AlgoliaConfig {
    /// Returns `(app_id, api_key, index)` when all three are set
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.app_id.as_deref()?,
            self.admin_api_key.as_deref()?,
            self.index_name.as_deref()?,
        ))
    }
}

/// Process-wide configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: Option<String>,
    pub api_docs_repo_path: Option<PathBuf>,
    pub redpanda_repo_path: Option<PathBuf>,
    pub cloudv2_repo_path: Option<PathBuf>,
    pub algolia: AlgoliaConfig,
    pub docs_root: PathBuf,
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> Self {
        let docs_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_lookup(|key| std::env::var(key).ok(), docs_root)
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F, docs_root: PathBuf) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let github_token = GITHUB_TOKEN_VARS.iter().find_map(|key| non_empty(key));

        Self {
            github_token,
            api_docs_repo_path: non_empty("API_DOCS_REPO_PATH").map(PathBuf::from),
            redpanda_repo_path: non_empty("REDPANDA_REPO_PATH").map(PathBuf::from),
            cloudv2_repo_path: non_empty("CLOUDV2_REPO_PATH").map(PathBuf::from),
            algolia: AlgoliaConfig {
                app_id: non_empty("ALGOLIA_APP_ID"),
                admin_api_key: non_empty("ALGOLIA_ADMIN_API_KEY"),
                index_name: non_empty("ALGOLIA_INDEX_NAME"),
            },
            docs_root,
        }
    }

    pub fn with_docs_root(mut self, docs_root: Option<PathBuf>) -> Self {
        if let Some(root) = docs_root {
            self.docs_root = root;
        }
        self
    }

    /// `docs-data/` under the docs root
    pub fn docs_data_dir(&self) -> PathBuf {
        self.docs_root.join("docs-data")
    }
}
