//! The worker execution loop: claim, execute, record outcome,
//! repeat. One job in flight per worker process at a time.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use queuectl_core::{decide_after_failure, Decision, JobPatch, JobState, JobStore, CONFIG_BACKOFF_BASE, CONFIG_BACKOFF_INITIAL_DELAY, ConfigDefaults};
use tokio::process::Command;
use tokio::time::timeout;

const POLL_INTERVAL: StdDuration = StdDuration::from_secs(1);
const COMMAND_TIMEOUT: StdDuration = StdDuration::from_secs(300);
const TIMEOUT_EXIT_CODE: i32 = 124;
const SPAWN_FAILURE_EXIT_CODE: i32 = 1;

/// Runs until interrupted. The current job, if any, always finishes or
/// times out naturally — a signal never aborts it mid-flight.
pub async fn run(store: impl JobStore, worker_id: String) {
    tracing::info!(worker_id = %worker_id, "worker started");

    let running = Arc::new(AtomicBool::new(true));
    spawn_signal_watcher(running.clone(), worker_id.clone());

    while running.load(Ordering::SeqCst) {
        match store.claim_next_job(&worker_id, Utc::now()).await {
            Ok(Some(job)) => {
                tracing::info!(worker_id = %worker_id, job_id = %job.id, "claimed job");
                let exit_code = execute(&job.command, &job.id).await;
                let recorded = if exit_code == 0 {
                    let ok = mark_completed(&store, &job.id).await;
                    tracing::info!(worker_id = %worker_id, job_id = %job.id, "job completed");
                    ok
                } else {
                    let ok = mark_failed(&store, &job.id, job.attempts, job.max_retries).await;
                    tracing::warn!(worker_id = %worker_id, job_id = %job.id, exit_code, "job failed");
                    ok
                };

                if !recorded {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
            Ok(None) => tokio::time::sleep(POLL_INTERVAL).await,
            Err(e) => {
                tracing::error!(worker_id = %worker_id, error = %e, "store error while polling, will retry");
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }

    tracing::info!(worker_id = %worker_id, "worker stopped");
}

fn spawn_signal_watcher(running: Arc<AtomicBool>, worker_id: String) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate());
            match term {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = term.recv() => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not install SIGTERM handler, watching SIGINT only");
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        tracing::info!(worker_id = %worker_id, "interrupt received, shutting down after current job");
        running.store(false, Ordering::SeqCst);
    });
}

async fn execute(command: &str, job_id: &str) -> i32 {
    tracing::debug!(job_id = %job_id, command, "executing command");

    let child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "failed to spawn command");
            return SPAWN_FAILURE_EXIT_CODE;
        }
    };

    match timeout(COMMAND_TIMEOUT, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            if !output.stdout.is_empty() {
                tracing::debug!(job_id = %job_id, stdout = %String::from_utf8_lossy(&output.stdout));
            }
            if !output.stderr.is_empty() {
                tracing::debug!(job_id = %job_id, stderr = %String::from_utf8_lossy(&output.stderr));
            }
            output.status.code().unwrap_or(SPAWN_FAILURE_EXIT_CODE)
        }
        Ok(Err(e)) => {
            tracing::error!(job_id = %job_id, error = %e, "failed to wait on command");
            SPAWN_FAILURE_EXIT_CODE
        }
        Err(_) => {
            tracing::warn!(job_id = %job_id, timeout_secs = COMMAND_TIMEOUT.as_secs(), "command timed out");
            TIMEOUT_EXIT_CODE
        }
    }
}

/// Returns `false` if the store update failed, so the caller can apply the
/// same poll-interval backoff used elsewhere in the loop on store errors.
async fn mark_completed(store: &impl JobStore, job_id: &str) -> bool {
    let patch = JobPatch {
        state: Some(JobState::Completed),
        locked_by: Some(None),
        locked_at: Some(None),
        ..Default::default()
    };
    match store.update_job(job_id, patch, Utc::now()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "failed to record job completion");
            false
        }
    }
}

/// Returns `false` if the store update failed, so the caller can apply the
/// same poll-interval backoff used elsewhere in the loop on store errors.
async fn mark_failed(store: &impl JobStore, job_id: &str, attempts: u32, max_retries: u32) -> bool {
    let now = Utc::now();
    let backoff_base = config_u32(store, CONFIG_BACKOFF_BASE, ConfigDefaults::BACKOFF_BASE).await;
    let backoff_initial_delay = config_u32(store, CONFIG_BACKOFF_INITIAL_DELAY, ConfigDefaults::BACKOFF_INITIAL_DELAY).await;

    let (new_attempts, decision) = decide_after_failure(attempts, max_retries, now, backoff_base, backoff_initial_delay);

    let patch = match decision {
        Decision::Retry { next_retry_at, .. } => JobPatch {
            state: Some(JobState::Pending),
            attempts: Some(new_attempts),
            next_retry_at: Some(Some(next_retry_at)),
            locked_by: Some(None),
            locked_at: Some(None),
        },
        Decision::Dead => JobPatch {
            state: Some(JobState::Dead),
            attempts: Some(new_attempts),
            next_retry_at: Some(None),
            locked_by: Some(None),
            locked_at: Some(None),
        },
    };

    match store.update_job(job_id, patch, now).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "failed to record job failure");
            false
        }
    }
}

async fn config_u32(store: &impl JobStore, key: &str, default: u32) -> u32 {
    match store.get_config(key, Some(&default.to_string())).await {
        Ok(Some(v)) => v.parse().unwrap_or(default),
        _ => default,
    }
}
