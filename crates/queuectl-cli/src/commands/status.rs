use queuectl_core::JobStore;

use crate::error::CliResult;

/// Print job-state counts, completion/failure rates and the active-work
/// priority breakdown, matching the original `status` command.
pub async fn run(store: &dyn JobStore) -> CliResult<()> {
    let counts = store.get_job_counts().await?;
    let total = counts.total();

    println!("Job Queue Status");
    println!("{}", "=".repeat(50));
    println!();
    println!("Jobs by State:");
    println!("  Pending:     {:>6}", counts.pending);
    println!("  Processing:  {:>6}", counts.processing);
    println!("  Completed:   {:>6}", counts.completed);
    println!("  Failed:      {:>6}", counts.failed);
    println!("  Dead (DLQ):  {:>6}", counts.dead);
    println!("{}", "-".repeat(50));
    println!("  Total:       {total:>6}");

    if total > 0 {
        println!();
        println!("Completion Rate:");
        let completion_rate = counts.completed as f64 / total as f64 * 100.0;
        println!("  {completion_rate:.1}% ({}/{total})", counts.completed);

        if counts.dead > 0 {
            let failure_rate = counts.dead as f64 / total as f64 * 100.0;
            println!();
            println!("Permanent Failures:");
            println!("  {failure_rate:.1}% ({}/{total})", counts.dead);
        }
    }

    let active = counts.pending + counts.processing;
    if active > 0 {
        println!();
        println!("Active/Pending Work: {active} job(s)");

        let priority_counts = store.get_priority_counts().await?;
        if priority_counts.total() > 0 {
            println!();
            println!("Active Jobs by Priority:");
            println!("  High:        {:>6}", priority_counts.high);
            println!("  Medium:      {:>6}", priority_counts.medium);
            println!("  Low:         {:>6}", priority_counts.low);
        }
    }

    println!("{}", "=".repeat(50));

    Ok(())
}
