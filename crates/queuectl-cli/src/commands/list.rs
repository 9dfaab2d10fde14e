use queuectl_core::{JobState, JobStore};

use crate::error::{CliError, CliResult};

pub async fn run(store: &dyn JobStore, state: Option<&str>) -> CliResult<()> {
    let state_filter = match state {
        None => None,
        Some(s) => Some(JobState::parse(s).ok_or_else(|| {
            eprintln!("Error: invalid state '{s}'");
            eprintln!("Valid states: pending, processing, completed, failed, dead");
            CliError::InvalidArgument(format!("invalid state '{s}'"))
        })?),
    };

    let jobs = store.list_jobs(state_filter, None).await?;

    match state {
        Some(s) => println!("Jobs with state: {s}"),
        None => println!("All jobs"),
    }
    println!("{}", "-".repeat(80));

    if jobs.is_empty() {
        println!("No jobs found.");
        return Ok(());
    }

    for job in &jobs {
        println!();
        println!("Job ID: {}", job.id);
        println!("  Command: {}", job.command);
        println!("  Priority: {}", job.priority.as_str());
        println!("  State: {}", job.state.as_str());
        println!("  Attempts: {}/{}", job.attempts, job.max_retries);
        println!("  Created: {}", job.created_at.to_rfc3339());
        println!("  Updated: {}", job.updated_at.to_rfc3339());
    }

    println!("{}", "-".repeat(80));
    println!("Total: {} job(s)", jobs.len());

    Ok(())
}
