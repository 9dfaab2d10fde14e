use std::path::Path;

use anyhow::Result;
use predicates::str::contains;
use tempfile::TempDir;

fn queuectl(db_path: &Path) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("queuectl")?;
    cmd.arg("--db").arg(db_path);
    Ok(cmd)
}

#[test]
fn enqueue_rejects_missing_command_field() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["enqueue", r#"{"id":"t1"}"#])
        .assert()
        .failure()
        .stderr(contains("missing required field 'command'"));

    Ok(())
}

#[test]
fn enqueue_rejects_empty_command() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["enqueue", r#"{"command":"   "}"#])
        .assert()
        .failure()
        .stderr(contains("cannot be empty"));

    Ok(())
}

#[test]
fn enqueue_rejects_invalid_json() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["enqueue", "not json"])
        .assert()
        .failure()
        .stderr(contains("invalid JSON"));

    Ok(())
}

#[test]
fn enqueue_rejects_invalid_priority() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["enqueue", r#"{"command":"echo hi","priority":"urgent"}"#])
        .assert()
        .failure()
        .stderr(contains("invalid priority"));

    Ok(())
}

#[test]
fn enqueue_then_list_shows_pending_job() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["enqueue", r#"{"id":"job-a","command":"echo hi"}"#])
        .assert()
        .success()
        .stdout(contains("Job successfully enqueued"));

    queuectl(&db)?
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("job-a"))
        .stdout(contains("Total: 1 job(s)"));

    Ok(())
}

#[test]
fn list_with_unknown_state_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["list", "--state", "bogus"])
        .assert()
        .failure()
        .stderr(contains("invalid state"));

    Ok(())
}

#[test]
fn status_on_empty_queue_shows_zero_counts() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["status"])
        .assert()
        .success()
        .stdout(contains("Job Queue Status"))
        .stdout(contains("Pending:"))
        .stdout(contains("Total:"));

    Ok(())
}

#[test]
fn dlq_retry_rejects_non_dead_job() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["enqueue", r#"{"id":"job-b","command":"echo hi"}"#])
        .assert()
        .success();

    queuectl(&db)?
        .args(["dlq", "retry", "job-b"])
        .assert()
        .failure()
        .stderr(contains("is not in the Dead Letter Queue"));

    Ok(())
}

#[test]
fn dlq_retry_rejects_unknown_job() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["dlq", "retry", "does-not-exist"])
        .assert()
        .failure();

    Ok(())
}

#[test]
fn dlq_list_on_empty_queue_reports_no_jobs() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["dlq", "list"])
        .assert()
        .success()
        .stdout(contains("No jobs in DLQ"));

    Ok(())
}

#[test]
fn config_round_trips_through_cli() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["config", "set", "max-retries", "7"])
        .assert()
        .success();

    queuectl(&db)?
        .args(["config", "get", "max-retries"])
        .assert()
        .success()
        .stdout(contains("max-retries = 7"));

    queuectl(&db)?
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(contains("max-retries = 7"));

    Ok(())
}

#[test]
fn config_get_unset_key_shows_default() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["config", "get", "backoff-base"])
        .assert()
        .success()
        .stdout(contains("is not set"))
        .stdout(contains("Default would be: 2"));

    Ok(())
}

#[test]
fn worker_start_rejects_zero_count() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["worker", "start", "--count", "0"])
        .assert()
        .failure();

    Ok(())
}

#[test]
fn admin_unstick_on_clean_queue_reclaims_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("queue.db");

    queuectl(&db)?
        .args(["admin", "unstick"])
        .assert()
        .success()
        .stdout(contains("No stuck jobs found"));

    Ok(())
}
