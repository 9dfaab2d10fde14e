use chrono::Utc;
use queuectl_core::{ConfigDefaults, Job, JobStore, Priority};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CliError, CliResult};

/// Parse, validate and insert a job from a JSON object literal.
///
/// Validation mirrors the original CLI's `enqueue` command: every rejected
/// field prints a concrete remediation example to stderr before returning
/// an error.
pub async fn run(store: &dyn JobStore, job_json: &str) -> CliResult<()> {
    let value: Value = serde_json::from_str(job_json).map_err(|e| {
        eprintln!("Error: invalid JSON - {e}");
        eprintln!();
        eprintln!("Example of valid JSON:");
        eprintln!(r#"  {{"command": "echo hello"}}"#);
        CliError::InvalidJson(e.to_string())
    })?;

    let obj = value.as_object().ok_or_else(|| {
        eprintln!("Error: JSON must be an object, not a list or primitive value");
        eprintln!();
        eprintln!("Example of valid JSON:");
        eprintln!(r#"  {{"command": "echo hello"}}"#);
        CliError::InvalidJson("top-level value is not an object".into())
    })?;

    println!("Successfully parsed JSON with {} field(s)", obj.len());

    let command = match obj.get("command").and_then(Value::as_str) {
        Some(c) if !c.trim().is_empty() => c.to_string(),
        Some(_) => {
            eprintln!("Error: field 'command' cannot be empty");
            eprintln!();
            eprintln!("The 'command' field must contain a valid shell command.");
            return Err(CliError::InvalidArgument("command must not be empty".into()));
        }
        None => {
            eprintln!("Error: missing required field 'command'");
            eprintln!();
            eprintln!("Example:");
            eprintln!(r#"  {{"command": "echo hello"}}"#);
            return Err(CliError::InvalidArgument("command is required".into()));
        }
    };

    let id = match obj.get("id") {
        None => Uuid::new_v4().to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => {
            eprintln!("Error: field 'id' cannot be empty");
            eprintln!("Tip: omit 'id' to have one generated for you.");
            return Err(CliError::InvalidArgument("id must not be empty".into()));
        }
        Some(_) => {
            eprintln!("Error: field 'id' must be a string");
            return Err(CliError::InvalidArgument("id must be a string".into()));
        }
    };

    let priority = match obj.get("priority") {
        None => Priority::default(),
        Some(Value::String(s)) => Priority::parse(s).ok_or_else(|| {
            eprintln!("Error: invalid priority '{s}'");
            eprintln!("Priority must be one of: high, medium, low");
            CliError::InvalidArgument(format!("invalid priority '{s}'"))
        })?,
        Some(_) => {
            eprintln!("Error: field 'priority' must be a string");
            return Err(CliError::InvalidArgument("priority must be a string".into()));
        }
    };

    let max_retries = match obj.get("max_retries") {
        None => ConfigDefaults::MAX_RETRIES,
        Some(v) => v.as_u64().ok_or_else(|| {
            eprintln!("Error: field 'max_retries' must be a non-negative integer");
            CliError::InvalidArgument("max_retries must be a non-negative integer".into())
        })? as u32,
    };

    println!("Validation passed");
    if obj.get("id").is_none() {
        println!("Generated job ID: {id}");
    } else {
        println!("Using provided job ID: {id}");
    }
    println!("  Command: {command}");

    let job = Job::new(id.clone(), command, priority, max_retries, Utc::now());
    store.create_job(job).await?;

    println!();
    println!("Job successfully enqueued!");
    println!("  Job ID: {id}");
    println!("  Priority: {}", priority.as_str());
    println!("  State: pending");
    println!("  Max Retries: {max_retries}");

    Ok(())
}
