//! In-memory background job queue for long-running tool calls.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cache::Clock;
use crate::error::{DocToolsError, ToolOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A job as reported to callers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: Uuid,
    pub tool: String,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ToolOutcome>,
}

struct JobRecord {
    snapshot: JobSnapshot,
    finished: Option<Instant>,
}

type JobTable = Arc<RwLock<HashMap<Uuid, JobRecord>>>;

/// Jobs run on the tokio runtime; finished jobs are kept for `retention`
#[derive(Clone)]
pub struct JobQueue {
    jobs: JobTable,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl JobQueue {
    pub fn new(retention: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            clock,
            retention,
        }
    }

    /// Queue `work` and return its id immediately
    pub async fn submit<F>(&self, tool: &str, work: F) -> Uuid
    where
        F: Future<Output = ToolOutcome> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let snapshot = JobSnapshot {
            id,
            tool: tool.to_string(),
            status: JobStatus::Queued,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
        };
        self.jobs.write().await.insert(
            id,
            JobRecord {
                snapshot,
                finished: None,
            },
        );
        tracing::info!("Queued job {} for {}", id, tool);

        let jobs = self.jobs.clone();
        let clock = self.clock.clone();
        tokio::spawn(async move {
            if let Some(job) = jobs.write().await.get_mut(&id) {
                job.snapshot.status = JobStatus::Running;
                job.snapshot.started_at = Some(Utc::now());
            }

            let outcome = match tokio::spawn(work).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Job {} did not run to completion: {}", id, e);
                    ToolOutcome::from(Err(DocToolsError::Other(anyhow::anyhow!("job aborted: {e}"))))
                }
            };

            if let Some(job) = jobs.write().await.get_mut(&id) {
                job.snapshot.status = if outcome.success {
                    JobStatus::Completed
                } else {
                    JobStatus::Failed
                };
                job.snapshot.finished_at = Some(Utc::now());
                job.snapshot.result = Some(outcome);
                job.finished = Some(clock.now());
                tracing::info!("Job {} finished as {:?}", id, job.snapshot.status);
            }
        });
        id
    }

    pub async fn status(&self, id: &Uuid) -> Option<JobSnapshot> {
        self.jobs.read().await.get(id).map(|j| j.snapshot.clone())
    }

    /// Every known job, oldest first, without results
    pub async fn list(&self) -> Vec<JobSnapshot> {
        let mut jobs: Vec<JobSnapshot> = self
            .jobs
            .read()
            .await
            .values()
            .map(|j| JobSnapshot {
                result: None,
                ..j.snapshot.clone()
            })
            .collect();
        jobs.sort_by_key(|j| j.submitted_at);
        jobs
    }

    /// Drop finished jobs older than the retention period
    pub async fn prune(&self) -> usize {
        let now = self.clock.now();
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.finished {
            Some(at) => now.duration_since(at) < self.retention,
            None => true,
        });
        before - jobs.len()
    }

    pub fn spawn_pruner(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let queue = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = queue.prune().await;
                if removed > 0 {
                    tracing::debug!("Pruned {} finished jobs", removed);
                }
            }
        })
    }
}
