use std::sync::Arc;
use std::time::Duration;

use doc_tools::cache::ManualClock;
use doc_tools::error::{DocToolsError, GenerationReport, ToolOutcome};
use doc_tools::jobs::{JobQueue, JobSnapshot, JobStatus};
use uuid::Uuid;

const RETENTION: Duration = Duration::from_secs(3600);

async fn wait_until_finished(queue: &JobQueue, id: &Uuid) -> JobSnapshot {
    for _ in 0..200 {
        let job = queue.status(id).await.unwrap();
        if job.status.is_finished() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} did not finish");
}

#[tokio::test]
async fn test_successful_job_completes() {
    let queue = JobQueue::new(RETENTION, Arc::new(ManualClock::new()));
    let id = queue
        .submit("generate_rpk_docs", async {
            let mut report = GenerationReport::default();
            report.count("pages", 3);
            ToolOutcome::from(Ok(report))
        })
        .await;

    let job = wait_until_finished(&queue, &id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.tool, "generate_rpk_docs");
    assert!(job.started_at.is_some());
    assert!(job.finished_at.is_some());
    assert_eq!(job.result.unwrap().counts["pages"], 3);
}

#[tokio::test]
async fn test_failed_outcome_marks_job_failed() {
    let queue = JobQueue::new(RETENTION, Arc::new(ManualClock::new()));
    let id = queue
        .submit("bundle_openapi", async {
            ToolOutcome::from(Err(DocToolsError::Validation("bad".to_string())))
        })
        .await;

    let job = wait_until_finished(&queue, &id).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.result.unwrap().error.as_deref(), Some("validation error: bad"));
}

fn crashing_generator() -> ToolOutcome {
    panic!("generator crashed")
}

#[tokio::test]
async fn test_panicking_job_is_marked_failed() {
    let clock = Arc::new(ManualClock::new());
    let queue = JobQueue::new(RETENTION, clock.clone());
    let id = queue
        .submit("generate_helm_docs", async { crashing_generator() })
        .await;

    let job = wait_until_finished(&queue, &id).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.finished_at.is_some());
    assert!(job.result.unwrap().error.unwrap().starts_with("job aborted:"));

    clock.advance(RETENTION);
    assert_eq!(queue.prune().await, 1);
}

#[tokio::test]
async fn test_unknown_job_has_no_status() {
    let queue = JobQueue::new(RETENTION, Arc::new(ManualClock::new()));
    assert!(queue.status(&Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn test_list_omits_results() {
    let queue = JobQueue::new(RETENTION, Arc::new(ManualClock::new()));
    let first = queue.submit("a", async { ToolOutcome::from(Ok(GenerationReport::default())) }).await;
    let second = queue.submit("b", async { ToolOutcome::from(Ok(GenerationReport::default())) }).await;
    wait_until_finished(&queue, &first).await;
    wait_until_finished(&queue, &second).await;

    let jobs = queue.list().await;
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|j| j.result.is_none()));
    assert!(jobs[0].submitted_at <= jobs[1].submitted_at);
}

#[tokio::test]
async fn test_prune_keeps_running_and_recent_jobs() {
    let clock = Arc::new(ManualClock::new());
    let queue = JobQueue::new(RETENTION, clock.clone());

    let done = queue.submit("done", async { ToolOutcome::from(Ok(GenerationReport::default())) }).await;
    let running = queue.submit("running", std::future::pending::<ToolOutcome>()).await;
    wait_until_finished(&queue, &done).await;

    clock.advance(Duration::from_secs(3599));
    assert_eq!(queue.prune().await, 0);

    clock.advance(Duration::from_secs(1));
    assert_eq!(queue.prune().await, 1);
    assert!(queue.status(&done).await.is_none());
    assert!(queue.status(&running).await.is_some());
}
