use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::StoreResult;
use crate::model::{Job, JobPatch, JobState, Priority};

/// Job counts by state. All five states are always present, even at zero —
/// callers (`status`) should never need to `.get().unwrap_or(0)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobCounts {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    pub dead: u64,
}

impl JobCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.processing + self.completed + self.failed + self.dead
    }

    pub fn get(&self, state: JobState) -> u64 {
        match state {
            JobState::Pending => self.pending,
            JobState::Processing => self.processing,
            JobState::Completed => self.completed,
            JobState::Failed => self.failed,
            JobState::Dead => self.dead,
        }
    }
}

/// Counts of `{pending, processing}` jobs broken down by priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl PriorityCounts {
    pub fn total(&self) -> u64 {
        self.high + self.medium + self.low
    }

    pub fn get(&self, priority: Priority) -> u64 {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

/// Durable persistence for Jobs and Config, and the provider of the
/// scheduler's one atomic primitive.
///
/// Implementors must guarantee:
/// - `create_job`, `update_job`, `claim_next_job` execute inside a write
///   transaction, serializable under concurrent access from multiple OS
///   processes, retried on contention.
/// - Readers (`get_job`, `list_jobs`, the count methods) observe a
///   consistent snapshot.
/// - Every successful mutation is durable before the call returns.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job. Fails with [`crate::StoreError::DuplicateId`] if
    /// `job.id` already exists, or [`crate::StoreError::Validation`] if
    /// `job.command` is empty after trimming.
    async fn create_job(&self, job: Job) -> StoreResult<()>;

    async fn get_job(&self, id: &str) -> StoreResult<Job>;

    /// Apply `patch` to the job with `id`, always refreshing `updated_at`
    /// to `now`. Fails with [`crate::StoreError::NotFound`] if absent.
    async fn update_job(&self, id: &str, patch: JobPatch, now: DateTime<Utc>) -> StoreResult<()>;

    /// List jobs, optionally restricted to `state`, ordered by
    /// `created_at` ascending (ties broken by `id` for determinism),
    /// optionally capped at `limit`.
    async fn list_jobs(&self, state: Option<JobState>, limit: Option<u64>) -> StoreResult<Vec<Job>>;

    /// The scheduler primitive: atomically select the
    /// highest-priority eligible job, mark it `Processing` under
    /// `worker_id`, and return it. Returns `Ok(None)` if nothing is
    /// eligible at `now`.
    async fn claim_next_job(&self, worker_id: &str, now: DateTime<Utc>) -> StoreResult<Option<Job>>;

    async fn get_job_counts(&self) -> StoreResult<JobCounts>;

    /// Counts by priority over jobs currently in `{Pending, Processing}`.
    async fn get_priority_counts(&self) -> StoreResult<PriorityCounts>;

    async fn set_config(&self, key: &str, value: &str) -> StoreResult<()>;

    async fn get_config(&self, key: &str, default: Option<&str>) -> StoreResult<Option<String>>;

    async fn list_config(&self) -> StoreResult<HashMap<String, String>>;

    /// Operator-invokable crash recovery: return any job
    /// stuck in `Processing` with `locked_at` older than `older_than` back
    /// to `Pending`, preserving `attempts`. Returns the number reclaimed.
    async fn reclaim_stale(&self, older_than: DateTime<Utc>) -> StoreResult<u64>;
}
