use chrono::Utc;
use queuectl_core::{JobPatch, JobState, JobStore};

use crate::error::{CliError, CliResult};

pub async fn list(store: &dyn JobStore) -> CliResult<()> {
    let dead_jobs = store.list_jobs(Some(JobState::Dead), None).await?;

    println!("Dead Letter Queue (DLQ)");
    println!("{}", "=".repeat(80));
    println!("These jobs have failed permanently after exhausting all retries.");
    println!();

    if dead_jobs.is_empty() {
        println!("No jobs in DLQ.");
        println!();
        println!("Tip: jobs are sent to the DLQ after failing max_retries times.");
        return Ok(());
    }

    for job in &dead_jobs {
        println!();
        println!("Job ID: {}", job.id);
        println!("  Command: {}", job.command);
        println!("  Priority: {}", job.priority.as_str());
        println!("  State: {}", job.state.as_str());
        println!("  Failed Attempts: {}/{}", job.attempts, job.max_retries);
        println!("  Created: {}", job.created_at.to_rfc3339());
        println!("  Last Updated: {}", job.updated_at.to_rfc3339());
    }

    println!("{}", "=".repeat(80));
    println!("Total jobs in DLQ: {}", dead_jobs.len());
    println!();
    println!("To retry a job: queuectl dlq retry <JOB_ID>");

    Ok(())
}

pub async fn retry(store: &dyn JobStore, job_id: &str) -> CliResult<()> {
    let job = store.get_job(job_id).await?;

    if job.state != JobState::Dead {
        eprintln!("Error: job '{job_id}' is not in the Dead Letter Queue");
        eprintln!("  Current state: {}", job.state.as_str());
        eprintln!();
        eprintln!("Only jobs in 'dead' state can be retried from the DLQ.");
        eprintln!("Use 'queuectl dlq list' to see jobs in the DLQ.");
        return Err(CliError::InvalidArgument(format!(
            "job '{job_id}' is in state '{}', expected 'dead'",
            job.state.as_str()
        )));
    }

    println!("Job '{job_id}':");
    println!("  Command: {}", job.command);
    println!("  Previous attempts: {}/{}", job.attempts, job.max_retries);

    store
        .update_job(
            job_id,
            JobPatch {
                state: Some(JobState::Pending),
                attempts: Some(0),
                locked_by: Some(None),
                locked_at: Some(None),
                next_retry_at: Some(None),
            },
            Utc::now(),
        )
        .await?;

    println!();
    println!("Job '{job_id}' has been reset and moved back to the queue");
    println!("  New state: pending");
    println!("  Attempts reset to: 0/{}", job.max_retries);
    println!();
    println!("The job will be picked up by the next available worker.");

    Ok(())
}
