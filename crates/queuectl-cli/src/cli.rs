use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// queuectl - a durable, multi-worker background job queue.
#[derive(Parser)]
#[command(name = "queuectl", version, about = "CLI-based background job queue system")]
pub struct Cli {
    /// Path to the SQLite store file.
    #[arg(long, global = true, default_value = "queue.db")]
    pub db: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a new job to the queue.
    Enqueue {
        /// JSON object literal, e.g. '{"command": "echo hello"}'
        job_json: String,
    },
    /// List jobs, optionally filtered by state.
    List {
        #[arg(long)]
        state: Option<String>,
    },
    /// Show a summary of job states and active work.
    Status,
    /// Manage worker processes.
    Worker {
        #[command(subcommand)]
        action: WorkerCommand,
    },
    /// Manage the Dead Letter Queue.
    Dlq {
        #[command(subcommand)]
        action: DlqCommand,
    },
    /// Manage configuration values.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Administrative maintenance operations.
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
    /// Internal: run a single worker loop. Spawned by `worker start`.
    #[command(name = "__worker-run", hide = true)]
    WorkerRun {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum WorkerCommand {
    /// Start one or more worker processes and wait on them.
    Start {
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Stop running workers.
    Stop,
}

#[derive(Subcommand)]
pub enum DlqCommand {
    /// List jobs that have permanently failed.
    List,
    /// Reset a dead job back to pending.
    Retry { job_id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Set a configuration value.
    Set { key: String, value: String },
    /// Get a configuration value.
    Get { key: String },
    /// List all configuration values.
    List,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Reclaim jobs stuck in `processing` for longer than a threshold.
    Unstick {
        #[arg(long = "older-than")]
        older_than: Option<u64>,
    },
}
