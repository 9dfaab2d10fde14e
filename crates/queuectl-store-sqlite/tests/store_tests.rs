use chrono::Utc;
use queuectl_core::{Job, JobPatch, JobState, JobStore, Priority};
use queuectl_store_sqlite::SqliteJobStore;

async fn open_tmp() -> (tempfile::TempDir, SqliteJobStore) {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("queue.db");
    let store = SqliteJobStore::open(&path).await.unwrap();
    (dir, store)
}

fn job(id: &str, priority: Priority) -> Job {
    Job::new(id.to_string(), "echo hi".to_string(), priority, 3, Utc::now())
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let (_dir, store) = open_tmp().await;
    let j = job("t1", Priority::Medium);
    store.create_job(j.clone()).await.unwrap();

    let fetched = store.get_job("t1").await.unwrap();
    assert_eq!(fetched.id, j.id);
    assert_eq!(fetched.command, j.command);
    assert_eq!(fetched.state, JobState::Pending);
    assert_eq!(fetched.attempts, 0);
}

#[tokio::test]
async fn duplicate_id_is_rejected() {
    let (_dir, store) = open_tmp().await;
    store.create_job(job("dup", Priority::Medium)).await.unwrap();

    let err = store.create_job(job("dup", Priority::Medium)).await.unwrap_err();
    assert!(matches!(err, queuectl_core::StoreError::DuplicateId(_)));
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let (_dir, store) = open_tmp().await;
    let mut j = job("bad", Priority::Medium);
    j.command = "   ".to_string();

    let err = store.create_job(j).await.unwrap_err();
    assert!(matches!(err, queuectl_core::StoreError::Validation(_)));
}

#[tokio::test]
async fn get_missing_job_is_not_found() {
    let (_dir, store) = open_tmp().await;
    let err = store.get_job("nope").await.unwrap_err();
    assert!(matches!(err, queuectl_core::StoreError::NotFound(_)));
}

#[tokio::test]
async fn claim_marks_processing_and_sets_lock() {
    let (_dir, store) = open_tmp().await;
    store.create_job(job("c1", Priority::Medium)).await.unwrap();

    let claimed = store.claim_next_job("worker-1", Utc::now()).await.unwrap().unwrap();
    assert_eq!(claimed.id, "c1");
    assert_eq!(claimed.state, JobState::Processing);
    assert_eq!(claimed.locked_by.as_deref(), Some("worker-1"));
    assert!(claimed.locked_at.is_some());

    // Not eligible a second time.
    assert!(store.claim_next_job("worker-2", Utc::now()).await.unwrap().is_none());
}

#[tokio::test]
async fn claim_picks_high_priority_first_even_if_enqueued_later() {
    let (_dir, store) = open_tmp().await;
    store.create_job(job("low-first", Priority::Low)).await.unwrap();
    store.create_job(job("high-second", Priority::High)).await.unwrap();

    let claimed = store.claim_next_job("worker-1", Utc::now()).await.unwrap().unwrap();
    assert_eq!(claimed.id, "high-second");
}

#[tokio::test]
async fn claim_respects_created_at_tie_break_within_priority() {
    let (_dir, store) = open_tmp().await;
    let now = Utc::now();
    let mut first = job("a", Priority::Medium);
    first.created_at = now;
    let mut second = job("b", Priority::Medium);
    second.created_at = now + chrono::Duration::seconds(5);
    store.create_job(second).await.unwrap();
    store.create_job(first).await.unwrap();

    let claimed = store.claim_next_job("worker-1", now).await.unwrap().unwrap();
    assert_eq!(claimed.id, "a");
}

#[tokio::test]
async fn claim_skips_future_next_retry_at() {
    let (_dir, store) = open_tmp().await;
    let mut j = job("retryable", Priority::Medium);
    j.next_retry_at = Some(Utc::now() + chrono::Duration::seconds(30));
    store.create_job(j).await.unwrap();

    assert!(store.claim_next_job("worker-1", Utc::now()).await.unwrap().is_none());

    let later = Utc::now() + chrono::Duration::seconds(31);
    let claimed = store.claim_next_job("worker-1", later).await.unwrap();
    assert!(claimed.is_some());
}

#[tokio::test]
async fn update_job_clears_lock_on_completion() {
    let (_dir, store) = open_tmp().await;
    store.create_job(job("done", Priority::Medium)).await.unwrap();
    store.claim_next_job("worker-1", Utc::now()).await.unwrap();

    store
        .update_job(
            "done",
            JobPatch {
                state: Some(JobState::Completed),
                locked_by: Some(None),
                locked_at: Some(None),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let j = store.get_job("done").await.unwrap();
    assert_eq!(j.state, JobState::Completed);
    assert!(j.locked_by.is_none());
    assert!(j.locked_at.is_none());
}

#[tokio::test]
async fn update_missing_job_is_not_found() {
    let (_dir, store) = open_tmp().await;
    let err = store
        .update_job("missing", JobPatch { attempts: Some(1), ..Default::default() }, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, queuectl_core::StoreError::NotFound(_)));
}

#[tokio::test]
async fn list_jobs_filters_by_state_in_created_order() {
    let (_dir, store) = open_tmp().await;
    let now = Utc::now();
    for (i, id) in ["j1", "j2", "j3"].iter().enumerate() {
        let mut j = job(id, Priority::Medium);
        j.created_at = now + chrono::Duration::seconds(i as i64);
        store.create_job(j).await.unwrap();
    }
    store.claim_next_job("worker-1", Utc::now()).await.unwrap();

    let pending = store.list_jobs(Some(JobState::Pending), None).await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].id, "j2");
    assert_eq!(pending[1].id, "j3");

    let processing = store.list_jobs(Some(JobState::Processing), None).await.unwrap();
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0].id, "j1");
}

#[tokio::test]
async fn job_counts_cover_all_states_even_at_zero() {
    let (_dir, store) = open_tmp().await;
    store.create_job(job("only", Priority::Medium)).await.unwrap();

    let counts = store.get_job_counts().await.unwrap();
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.processing, 0);
    assert_eq!(counts.completed, 0);
    assert_eq!(counts.failed, 0);
    assert_eq!(counts.dead, 0);
}

#[tokio::test]
async fn priority_counts_only_cover_active_jobs() {
    let (_dir, store) = open_tmp().await;
    store.create_job(job("h", Priority::High)).await.unwrap();
    store.create_job(job("l", Priority::Low)).await.unwrap();
    store
        .update_job(
            "l",
            JobPatch { state: Some(JobState::Completed), ..Default::default() },
            Utc::now(),
        )
        .await
        .unwrap();

    let counts = store.get_priority_counts().await.unwrap();
    assert_eq!(counts.high, 1);
    assert_eq!(counts.low, 0);
}

#[tokio::test]
async fn config_round_trips() {
    let (_dir, store) = open_tmp().await;
    store.set_config("backoff-base", "5").await.unwrap();
    let v = store.get_config("backoff-base", Some("2")).await.unwrap();
    assert_eq!(v.as_deref(), Some("5"));

    let missing = store.get_config("unset-key", Some("fallback")).await.unwrap();
    assert_eq!(missing.as_deref(), Some("fallback"));

    let all = store.list_config().await.unwrap();
    assert_eq!(all.get("backoff-base").map(String::as_str), Some("5"));
}

#[tokio::test]
async fn reclaim_stale_returns_stuck_jobs_to_pending() {
    let (_dir, store) = open_tmp().await;
    store.create_job(job("stuck", Priority::Medium)).await.unwrap();
    store.claim_next_job("worker-1", Utc::now() - chrono::Duration::minutes(20)).await.unwrap();

    let threshold = Utc::now() - chrono::Duration::minutes(10);
    let reclaimed = store.reclaim_stale(threshold).await.unwrap();
    assert_eq!(reclaimed, 1);

    let j = store.get_job("stuck").await.unwrap();
    assert_eq!(j.state, JobState::Pending);
    assert!(j.locked_by.is_none());
}

#[tokio::test]
async fn dlq_retry_resets_attempts_and_lock() {
    let (_dir, store) = open_tmp().await;
    let mut j = job("dead1", Priority::Medium);
    j.state = JobState::Dead;
    j.attempts = 3;
    store.create_job(j).await.unwrap();

    store
        .update_job(
            "dead1",
            JobPatch {
                state: Some(JobState::Pending),
                attempts: Some(0),
                locked_by: Some(None),
                locked_at: Some(None),
                next_retry_at: Some(None),
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let j = store.get_job("dead1").await.unwrap();
    assert_eq!(j.state, JobState::Pending);
    assert_eq!(j.attempts, 0);
}

/// Adapted from the pack's SQLite claim-stress pattern: many concurrent
/// claimers racing a shared backlog must never double-claim a job.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_claims_never_double_claim() {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    let (_dir, store) = open_tmp().await;
    let store = Arc::new(store);

    const JOBS: usize = 60;
    const WORKERS: usize = 12;

    for i in 0..JOBS {
        store.create_job(job(&format!("job-{i}"), Priority::Medium)).await.unwrap();
    }

    let claimed_ids = Arc::new(Mutex::new(HashSet::new()));
    let mut handles = Vec::new();

    for w in 0..WORKERS {
        let store = store.clone();
        let claimed_ids = claimed_ids.clone();
        handles.push(tokio::spawn(async move {
            let worker_id = format!("worker-{w}");
            loop {
                match store.claim_next_job(&worker_id, Utc::now()).await.unwrap() {
                    Some(j) => {
                        let mut seen = claimed_ids.lock().unwrap();
                        assert!(seen.insert(j.id.clone()), "double-claimed {}", j.id);
                    }
                    None => break,
                }
            }
        }));
    }

    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(claimed_ids.lock().unwrap().len(), JOBS);
}
