use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use queuectl_core::{Job, JobCounts, JobPatch, JobState, JobStore, Priority, PriorityCounts, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::migrations::run_migrations;

type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed [`JobStore`]. A single file (default `queue.db`) holds
/// both the `jobs` and `config` tables.
///
/// Opened with WAL journaling and a busy timeout so that concurrent write
/// transactions from other OS processes block briefly rather than failing
/// outright; [`claim_next_job`] additionally retries with a short capped
/// backoff if the busy timeout itself is exceeded, so a contended claim
/// never blocks indefinitely.
#[derive(Clone)]
pub struct SqliteJobStore {
    pool: SqlitePool,
}

const BUSY_TIMEOUT_MS: u64 = 5_000;
const MAX_CLAIM_RETRIES: u32 = 8;

impl SqliteJobStore {
    /// Open (creating if absent) the SQLite file at `path` and run
    /// migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, sqlx::Error> {
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().to_string_lossy());
        let options = SqliteConnectOptions::from_str(&url)?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(StdDuration::from_millis(BUSY_TIMEOUT_MS))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        Ok(SqliteJobStore { pool })
    }

    /// Open an in-memory database, for tests.
    pub async fn open_in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .busy_timeout(StdDuration::from_millis(BUSY_TIMEOUT_MS));
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        run_migrations(&pool).await?;
        Ok(SqliteJobStore { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_busy(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("5") || db.code().as_deref() == Some("6"))
}

/// Retry a fallible write a bounded number of times on SQLITE_BUSY/LOCKED,
/// with a short jittered backoff.
async fn with_busy_retry<F, Fut, T>(mut op: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if is_busy(&e) && attempt < MAX_CLAIM_RETRIES => {
                let base_ms = 2u64.saturating_pow(attempt.min(6));
                let jitter_ms = rand::random::<u64>() % 10;
                tokio::time::sleep(StdDuration::from_millis(base_ms + jitter_ms)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    command: String,
    priority: String,
    state: String,
    attempts: i64,
    max_retries: i64,
    created_at: String,
    updated_at: String,
    next_retry_at: Option<String>,
    locked_by: Option<String>,
    locked_at: Option<String>,
}

impl JobRow {
    fn into_job(self) -> Result<Job, StoreError> {
        Ok(Job {
            id: self.id,
            command: self.command,
            priority: Priority::parse(&self.priority)
                .ok_or_else(|| StoreError::Validation(format!("corrupt priority '{}'", self.priority)))?,
            state: JobState::parse(&self.state)
                .ok_or_else(|| StoreError::Validation(format!("corrupt state '{}'", self.state)))?,
            attempts: self.attempts as u32,
            max_retries: self.max_retries as u32,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
            next_retry_at: self.next_retry_at.as_deref().map(parse_ts).transpose()?,
            locked_by: self.locked_by,
            locked_at: self.locked_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Validation(format!("corrupt timestamp '{s}': {e}")))
}

fn fmt_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// `ORDER BY` fragment implementing the selection order: priority
/// (high first), then `created_at` ascending, then `id` ascending.
const SELECTION_ORDER: &str = "CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 WHEN 'low' THEN 2 ELSE 3 END ASC, created_at ASC, id ASC";

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn create_job(&self, job: Job) -> StoreResult<()> {
        if job.command.trim().is_empty() {
            return Err(StoreError::Validation("command must not be empty".into()));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (id, command, priority, state, attempts, max_retries, created_at, updated_at, next_retry_at, locked_by, locked_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.command)
        .bind(job.priority.as_str())
        .bind(job.state.as_str())
        .bind(job.attempts as i64)
        .bind(job.max_retries as i64)
        .bind(fmt_ts(job.created_at))
        .bind(fmt_ts(job.updated_at))
        .bind(job.next_retry_at.map(fmt_ts))
        .bind(&job.locked_by)
        .bind(job.locked_at.map(fmt_ts))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("1555") || db.code().as_deref() == Some("2067") => {
                Err(StoreError::DuplicateId(job.id))
            }
            Err(e) => Err(StoreError::Backend(e.into())),
        }
    }

    async fn get_job(&self, id: &str) -> StoreResult<Job> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        match row {
            Some(row) => row.into_job(),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn update_job(&self, id: &str, patch: JobPatch, now: DateTime<Utc>) -> StoreResult<()> {
        let mut set_parts: Vec<String> = vec!["updated_at = ?".to_string()];
        if patch.state.is_some() {
            set_parts.push("state = ?".to_string());
        }
        if patch.attempts.is_some() {
            set_parts.push("attempts = ?".to_string());
        }
        if patch.next_retry_at.is_some() {
            set_parts.push("next_retry_at = ?".to_string());
        }
        if patch.locked_by.is_some() {
            set_parts.push("locked_by = ?".to_string());
        }
        if patch.locked_at.is_some() {
            set_parts.push("locked_at = ?".to_string());
        }

        let sql = format!("UPDATE jobs SET {} WHERE id = ?", set_parts.join(", "));

        let build = || {
            let mut q = sqlx::query(&sql).bind(fmt_ts(now));
            if let Some(state) = patch.state {
                q = q.bind(state.as_str());
            }
            if let Some(attempts) = patch.attempts {
                q = q.bind(attempts as i64);
            }
            if let Some(next_retry_at) = patch.next_retry_at {
                q = q.bind(next_retry_at.map(fmt_ts));
            }
            if let Some(locked_by) = patch.locked_by.clone() {
                q = q.bind(locked_by);
            }
            if let Some(locked_at) = patch.locked_at {
                q = q.bind(locked_at.map(fmt_ts));
            }
            q.bind(id)
        };

        let result = with_busy_retry(|| build().execute(&self.pool))
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_jobs(&self, state: Option<JobState>, limit: Option<u64>) -> StoreResult<Vec<Job>> {
        let mut sql = String::from("SELECT * FROM jobs");
        if state.is_some() {
            sql.push_str(" WHERE state = ?");
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");
        if limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut q = sqlx::query_as::<_, JobRow>(&sql);
        if let Some(state) = state {
            q = q.bind(state.as_str().to_string());
        }
        if let Some(limit) = limit {
            q = q.bind(limit as i64);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(|e| StoreError::Backend(e.into()))?;
        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn claim_next_job(&self, worker_id: &str, now: DateTime<Utc>) -> StoreResult<Option<Job>> {
        let now_str = fmt_ts(now);
        let sql = format!(
            r#"
            UPDATE jobs
            SET state = 'processing', locked_by = ?, locked_at = ?, updated_at = ?
            WHERE id = (
                SELECT id FROM jobs
                WHERE state = 'pending'
                  AND locked_by IS NULL
                  AND (next_retry_at IS NULL OR next_retry_at <= ?)
                ORDER BY {SELECTION_ORDER}
                LIMIT 1
            )
            RETURNING *
            "#
        );

        let row = with_busy_retry(|| async {
            sqlx::query_as::<_, JobRow>(&sql)
                .bind(worker_id)
                .bind(&now_str)
                .bind(&now_str)
                .bind(&now_str)
                .fetch_optional(&self.pool)
                .await
        })
        .await
        .map_err(|e| StoreError::Backend(e.into()))?;

        row.map(JobRow::into_job).transpose()
    }

    async fn get_job_counts(&self) -> StoreResult<JobCounts> {
        let rows = sqlx::query("SELECT state, COUNT(*) as n FROM jobs GROUP BY state")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        let mut counts = JobCounts::default();
        for row in rows {
            let state: String = row.get("state");
            let n: i64 = row.get("n");
            match JobState::parse(&state) {
                Some(JobState::Pending) => counts.pending = n as u64,
                Some(JobState::Processing) => counts.processing = n as u64,
                Some(JobState::Completed) => counts.completed = n as u64,
                Some(JobState::Failed) => counts.failed = n as u64,
                Some(JobState::Dead) => counts.dead = n as u64,
                None => {}
            }
        }
        Ok(counts)
    }

    async fn get_priority_counts(&self) -> StoreResult<PriorityCounts> {
        let rows = sqlx::query(
            "SELECT priority, COUNT(*) as n FROM jobs WHERE state IN ('pending', 'processing') GROUP BY priority",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.into()))?;

        let mut counts = PriorityCounts::default();
        for row in rows {
            let priority: String = row.get("priority");
            let n: i64 = row.get("n");
            match Priority::parse(&priority) {
                Some(Priority::High) => counts.high = n as u64,
                Some(Priority::Medium) => counts.medium = n as u64,
                Some(Priority::Low) => counts.low = n as u64,
                None => {}
            }
        }
        Ok(counts)
    }

    async fn set_config(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query("INSERT INTO config (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;
        Ok(())
    }

    async fn get_config(&self, key: &str, default: Option<&str>) -> StoreResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM config WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        Ok(value.or_else(|| default.map(str::to_string)))
    }

    async fn list_config(&self) -> StoreResult<HashMap<String, String>> {
        let rows = sqlx::query("SELECT key, value FROM config ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        Ok(rows.into_iter().map(|row| (row.get("key"), row.get("value"))).collect())
    }

    async fn reclaim_stale(&self, older_than: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET state = 'pending', locked_by = NULL, locked_at = NULL, updated_at = ?
            WHERE state = 'processing' AND locked_at < ?
            "#,
        )
        .bind(fmt_ts(Utc::now()))
        .bind(fmt_ts(older_than))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.into()))?;

        Ok(result.rows_affected())
    }
}
