use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordering hint for claim order: `High` jobs are claimed before `Medium`
/// before `Low`, regardless of enqueue order (ties broken by `created_at`,
/// then `id` — see [`crate::JobStore::claim_next_job`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// A job's position in its lifecycle.
///
/// `Failed` is reserved but never entered by the worker loop:
/// failures route directly to `Pending` (retry) or `Dead`. It is kept in
/// the enum because `list_jobs` and the CLI's `--state` filter both accept
/// it, and because an administrative transition into it is conceivable
/// even though nothing in this crate produces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
    Dead,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Dead => "dead",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobState::Pending),
            "processing" => Some(JobState::Processing),
            "completed" => Some(JobState::Completed),
            "failed" => Some(JobState::Failed),
            "dead" => Some(JobState::Dead),
            _ => None,
        }
    }

    /// All states, in the fixed order `get_job_counts` reports them.
    pub const ALL: [JobState; 5] = [
        JobState::Pending,
        JobState::Processing,
        JobState::Completed,
        JobState::Failed,
        JobState::Dead,
    ];
}

/// A unit of work: a shell command with lifecycle metadata.
///
/// Invariants (enforced by the [`crate::JobStore`] implementation, not by
/// this struct's constructor — rows read back from the store must satisfy
/// them just as much as rows about to be inserted):
///
/// - `state == Processing` iff `locked_by` and `locked_at` are both `Some`.
/// - `next_retry_at` is only ever `Some` when `state == Pending` and
///   `attempts > 0`.
/// - `attempts <= max_retries + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub priority: Priority,
    pub state: JobState,
    pub attempts: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub locked_by: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Build a new job in `Pending` state, timestamped at `now`.
    ///
    /// Callers (the enqueue command, store seeding in tests) are
    /// responsible for validating `command` is non-empty and `id` is a
    /// fresh identifier; `create_job` re-validates regardless.
    pub fn new(id: String, command: String, priority: Priority, max_retries: u32, now: DateTime<Utc>) -> Self {
        Job {
            id,
            command,
            priority,
            state: JobState::Pending,
            attempts: 0,
            max_retries,
            created_at: now,
            updated_at: now,
            next_retry_at: None,
            locked_by: None,
            locked_at: None,
        }
    }
}

/// A field-level patch applied by `update_job`. Every field left `None` is
/// left untouched; `updated_at` is always bumped to the call's `now`
/// regardless of which fields are present.
///
/// The lock-clearing fields use a double `Option` so a patch can
/// distinguish "don't touch this column" from "set this column to NULL".
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub state: Option<JobState>,
    pub attempts: Option<u32>,
    pub next_retry_at: Option<Option<DateTime<Utc>>>,
    pub locked_by: Option<Option<String>>,
    pub locked_at: Option<Option<DateTime<Utc>>>,
}
