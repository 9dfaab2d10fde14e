//! Spawns and reaps worker OS processes. Each worker is a re-exec
//! of this same binary with the hidden `__worker-run` subcommand, since
//! there is no process-forking primitive in stable async Rust analogous
//! to `multiprocessing.Process`.

use std::io::{self, Write};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration as StdDuration;

use anyhow::{bail, Result};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::time::timeout;

const GRACE_PERIOD: StdDuration = StdDuration::from_secs(5);
const CONFIRM_THRESHOLD: u32 = 10;

pub async fn start(db_path: &Path, count: u32) -> Result<()> {
    if count < 1 {
        bail!("count must be at least 1");
    }

    if count > CONFIRM_THRESHOLD {
        eprintln!("Warning: starting more than {CONFIRM_THRESHOLD} workers may cause performance issues.");
        if !confirm("Continue anyway?") {
            bail!("aborted");
        }
    }

    let exe = std::env::current_exe()?;
    let mut children: Vec<(String, Child)> = Vec::new();

    println!("Starting {count} worker(s)...");
    println!();

    for i in 1..=count {
        let worker_id = format!("worker-{i}");
        let child = Command::new(&exe)
            .arg("--db")
            .arg(db_path)
            .arg("__worker-run")
            .arg("--id")
            .arg(&worker_id)
            .stdin(Stdio::null())
            .spawn()?;

        println!("Started {worker_id} (PID: {})", child.id().unwrap_or(0));
        children.push((worker_id, child));
    }

    println!();
    println!("{count} worker(s) running. Press Ctrl+C to stop all workers.");
    println!();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("Shutting down all workers...");
            shutdown(children).await;
        }
        _ = wait_all(&mut children) => {}
    }

    Ok(())
}

async fn wait_all(children: &mut [(String, Child)]) {
    for (_, child) in children.iter_mut() {
        let _ = child.wait().await;
    }
}

async fn shutdown(children: Vec<(String, Child)>) {
    for (worker_id, child) in &children {
        if let Some(pid) = child.id() {
            println!("  Stopping {worker_id}...");
            let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        }
    }

    for (worker_id, mut child) in children {
        if timeout(GRACE_PERIOD, child.wait()).await.is_err() {
            if let Some(pid) = child.id() {
                tracing::warn!(worker_id = %worker_id, "worker did not exit in time, sending SIGKILL");
                let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
                let _ = child.wait().await;
            }
        }
    }

    println!("All workers stopped.");
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}
