//! `queuectl` — CLI front-end, worker loop and supervisor for a durable,
//! multi-worker background job queue backed by a single SQLite file.

mod cli;
mod commands;
mod error;
mod supervisor;
mod worker;

use std::process::ExitCode;

use clap::Parser;
use cli::{AdminCommand, Cli, Command, ConfigCommand, DlqCommand, WorkerCommand};
use queuectl_store_sqlite::SqliteJobStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "queuectl=info",
        1 => "queuectl=debug",
        _ => "queuectl=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Command::WorkerRun { id } = &cli.command {
        let store = SqliteJobStore::open(&cli.db).await?;
        worker::run(store, id.clone()).await;
        return Ok(());
    }

    let store = SqliteJobStore::open(&cli.db).await?;

    match cli.command {
        Command::Enqueue { job_json } => commands::enqueue::run(&store, &job_json).await?,
        Command::List { state } => commands::list::run(&store, state.as_deref()).await?,
        Command::Status => commands::status::run(&store).await?,
        Command::Worker { action } => match action {
            WorkerCommand::Start { count } => supervisor::start(&cli.db, count).await?,
            WorkerCommand::Stop => commands::worker::stop(),
        },
        Command::Dlq { action } => match action {
            DlqCommand::List => commands::dlq::list(&store).await?,
            DlqCommand::Retry { job_id } => commands::dlq::retry(&store, &job_id).await?,
        },
        Command::Config { action } => match action {
            ConfigCommand::Set { key, value } => commands::config::set(&store, &key, &value).await?,
            ConfigCommand::Get { key } => commands::config::get(&store, &key).await?,
            ConfigCommand::List => commands::config::list(&store).await?,
        },
        Command::Admin { action } => match action {
            AdminCommand::Unstick { older_than } => commands::admin::unstick(&store, older_than).await?,
        },
        Command::WorkerRun { .. } => unreachable!("handled above"),
    }

    Ok(())
}
