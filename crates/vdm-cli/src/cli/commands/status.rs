//! `vdm status` – show active jobs and recent completions.

use anyhow::Result;
use vdm_core::scheduler::Scheduler;

/// How many completed jobs the status view shows.
const COMPLETED_LIMIT: i64 = 10;

pub async fn run_status(scheduler: &Scheduler) -> Result<()> {
    let active = scheduler.list_active().await?;
    if active.is_empty() {
        println!("No active jobs.");
    } else {
        println!("{:<6} {:<12} {:<10} {:<10} {}", "ID", "STATUS", "PROGRESS", "PLATFORM", "URL");
        for j in &active {
            println!(
                "{:<6} {:<12} {:<10} {:<10} {}",
                j.id,
                j.status.as_str(),
                format!("{:.1}%", j.progress),
                j.platform,
                j.url
            );
        }
    }

    let completed = scheduler.list_completed(COMPLETED_LIMIT).await?;
    if !completed.is_empty() {
        println!();
        println!("{:<6} {:<10} {}", "ID", "SIZE", "FILE");
        for j in &completed {
            let size_str = j
                .file_size
                .map(|s| format!("{s}"))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<6} {:<10} {}",
                j.id,
                size_str,
                j.file_path.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(())
}
