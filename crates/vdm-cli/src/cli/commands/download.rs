//! `vdm download <url>...` – submit URLs and follow them to a terminal state.

use anyhow::Result;
use std::time::Duration;
use vdm_core::job_store::{JobStatus, MediaFormat};
use vdm_core::scheduler::Scheduler;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub async fn run_download(
    scheduler: &Scheduler,
    urls: &[String],
    quality: &str,
    format: MediaFormat,
) -> Result<()> {
    let raw = urls.join("\n");
    let outcome = scheduler.submit(&raw, quality, format).await?;

    for rejected in &outcome.rejected {
        eprintln!("invalid URL: {} ({})", rejected.url, rejected.reason);
    }
    if outcome.created.is_empty() {
        anyhow::bail!("no valid URLs submitted");
    }
    println!("started {} download(s)", outcome.created.len());

    // Follow progress until every submitted job is terminal.
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let mut all_terminal = true;
        for id in &outcome.created {
            let Some(job) = scheduler.get_job(*id).await? else {
                continue;
            };
            if job.status.is_terminal() {
                continue;
            }
            all_terminal = false;
            let title = job.title.as_deref().unwrap_or(&job.url);
            println!(
                "  job {:<4} {:<12} {:>5.1}%  {}",
                job.id,
                job.status.as_str(),
                job.progress,
                title
            );
        }
        if all_terminal {
            break;
        }
    }
    scheduler.wait_idle().await;

    for id in &outcome.created {
        let Some(job) = scheduler.get_job(*id).await? else {
            continue;
        };
        match job.status {
            JobStatus::Completed => {
                println!(
                    "job {} completed: {}",
                    job.id,
                    job.file_path.as_deref().unwrap_or("-")
                );
            }
            JobStatus::Failed => {
                println!(
                    "job {} failed: {}",
                    job.id,
                    job.error_message.as_deref().unwrap_or("unknown error")
                );
            }
            other => println!("job {} ended in state {}", job.id, other.as_str()),
        }
    }

    Ok(())
}
