//! `vdm export` – dump all jobs as JSON.

use anyhow::Result;
use vdm_core::scheduler::Scheduler;

pub async fn run_export(scheduler: &Scheduler) -> Result<()> {
    let jobs = scheduler.list_all().await?;
    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}
