//! Download worker: drives one job from pending to a terminal state.
//!
//! The worker is the sole writer to its job's mutable fields. The blocking
//! extractor runs under `spawn_blocking`; progress events flow back over a
//! channel and are applied here, so every state transition for the job is
//! strictly sequential.


use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::VdmConfig;
use crate::extractor::{options, FetchEvent, FetchRequest, MediaExtractor, ProbeMetadata};
use crate::job_store::{JobId, JobStatus, JobStore, MediaInfo};

/// Longest title persisted from a probe, in characters.
const MAX_TITLE_LEN: usize = 200;

/// Progress ceiling while a transfer is still running; 100 is reserved for
/// confirmed completion.
const PROGRESS_CAP: f64 = 99.0;

fn media_info_from_probe(meta: &ProbeMetadata) -> MediaInfo {
    let title = meta.title.as_deref().map(|t| {
        if t.chars().count() > MAX_TITLE_LEN {
            t.chars().take(MAX_TITLE_LEN).collect()
        } else {
            t.to_string()
        }
    });
    MediaInfo {
        title,
        thumbnail_url: meta.thumbnail_url.clone(),
        duration_secs: meta.duration_secs,
        file_size: meta.file_size,
    }
}

/// Runs a single job end-to-end: probe (best effort), transfer, progress
/// propagation, terminal status.
///
/// A failed transfer is recorded on the job and is not an error here; Err
/// means the orchestration itself broke (store unreachable, task join).
pub async fn run_job(
    store: &JobStore,
    extractor: Arc<dyn MediaExtractor>,
    cfg: &VdmConfig,
    job_id: JobId,
) -> Result<()> {
    let job = store
        .get_job(job_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("job {} not found", job_id))?;

    store.set_status(job_id, JobStatus::Downloading).await?;

    // Metadata probe: failure is non-fatal, but captured, not swallowed.
    let probe_result = tokio::task::spawn_blocking({
        let extractor = Arc::clone(&extractor);
        let url = job.url.clone();
        move || extractor.probe(&url)
    })
    .await
    .context("probe task join")?;

    let title = match probe_result {
        Ok(meta) => {
            let info = media_info_from_probe(&meta);
            store.update_media_info(job_id, &info).await?;
            info.title
        }
        Err(e) => {
            tracing::warn!(
                job_id,
                error = %format!("{e:#}"),
                "metadata probe failed, continuing without metadata"
            );
            None
        }
    };

    let download_dir = cfg.resolved_download_dir();
    tokio::fs::create_dir_all(&download_dir)
        .await
        .with_context(|| format!("create download dir: {}", download_dir.display()))?;

    let request = FetchRequest {
        url: job.url.clone(),
        output_template: options::output_template(&download_dir, job_id, title.as_deref()),
        quality: job.quality.clone(),
        format: job.format,
    };

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let fetch_handle = tokio::task::spawn_blocking({
        let extractor = Arc::clone(&extractor);
        let request = request.clone();
        move || extractor.fetch(&request, &events_tx)
    });

    // Apply progress events until the sender side (the transfer) is done.
    let mut last_progress = job.progress;
    let mut converting = false;
    while let Some(event) = events_rx.recv().await {
        match event {
            FetchEvent::Transferred {
                downloaded_bytes,
                total_bytes: Some(total),
            } if total > 0 => {
                let pct = (downloaded_bytes as f64 / total as f64 * 100.0).min(PROGRESS_CAP);
                if pct > last_progress {
                    last_progress = pct;
                    if store.set_progress(job_id, pct).await.is_err() {
                        tracing::warn!(job_id, "progress update failed");
                    }
                }
            }
            // Total unknown: leave progress at its last known value.
            FetchEvent::Transferred { .. } => {}
            FetchEvent::PostProcessing => {
                if !converting {
                    converting = true;
                    if store.set_status(job_id, JobStatus::Converting).await.is_err() {
                        tracing::warn!(job_id, "converting status update failed");
                    }
                }
            }
        }
    }

    let fetch_result = fetch_handle.await.context("fetch task join")?;

    match fetch_result {
        Ok(path) => match tokio::fs::metadata(&path).await {
            Ok(meta) => {
                store
                    .mark_completed(job_id, &path.to_string_lossy(), meta.len() as i64)
                    .await?;
                tracing::info!(job_id, path = %path.display(), "job completed");
            }
            Err(_) => {
                let msg = format!(
                    "download finished but artifact is missing: {}",
                    path.display()
                );
                store.mark_failed(job_id, &msg).await?;
                tracing::error!(job_id, "{}", msg);
            }
        },
        Err(e) => {
            let msg = e.to_string();
            store.mark_failed(job_id, &msg).await?;
            tracing::error!(job_id, error = %msg, "job failed");
        }
    }

    Ok(())
}
