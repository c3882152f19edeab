//! `vdm file <id>` – print the artifact path of a completed job.

use anyhow::Result;
use vdm_core::job_store::JobId;
use vdm_core::scheduler::Scheduler;

pub async fn run_file(scheduler: &Scheduler, id: JobId) -> Result<()> {
    let path = scheduler.job_file(id).await?;
    println!("{}", path.display());
    Ok(())
}
