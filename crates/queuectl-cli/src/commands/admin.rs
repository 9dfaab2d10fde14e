use chrono::{Duration, Utc};
use queuectl_core::JobStore;

use crate::error::CliResult;

/// A job locked for longer than this without completing is assumed to
/// belong to a crashed worker.
const DEFAULT_UNSTICK_OLDER_THAN_SECS: u64 = 600;

pub async fn unstick(store: &dyn JobStore, older_than_secs: Option<u64>) -> CliResult<()> {
    let older_than_secs = older_than_secs.unwrap_or(DEFAULT_UNSTICK_OLDER_THAN_SECS);
    let threshold = Utc::now() - Duration::seconds(older_than_secs as i64);

    let reclaimed = store.reclaim_stale(threshold).await?;

    if reclaimed == 0 {
        println!("No stuck jobs found.");
    } else {
        println!("Reclaimed {reclaimed} stuck job(s) back to pending.");
    }

    Ok(())
}
