//! Job scheduler: submission validation, worker dispatch, query surface.
//!
//! Submissions create one pending job per valid URL and spawn an independent
//! worker task for each; the call returns without waiting on any transfer.
//! A semaphore bounds how many transfers run at once so a large batch queues
//! instead of exhausting the machine.


use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use url::Url;

use crate::config::VdmConfig;
use crate::extractor::MediaExtractor;
use crate::job_store::{JobId, JobRecord, JobStatus, JobStore, MediaFormat, NewJob};
use crate::platform;
use crate::worker;

/// A submitted line that did not survive validation.
#[derive(Debug, Clone)]
pub struct RejectedUrl {
    pub url: String,
    pub reason: String,
}

/// Result of one submission batch.
#[derive(Debug, Default)]
pub struct SubmitOutcome {
    pub created: Vec<JobId>,
    pub rejected: Vec<RejectedUrl>,
}

/// Error from the artifact-retrieval surface.
#[derive(Debug, thiserror::Error)]
pub enum FileAccessError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job {0} has not completed")]
    NotReady(JobId),
    #[error("artifact for job {0} is missing from disk")]
    Missing(JobId),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Owns the store, the extractor, and the worker tasks.
pub struct Scheduler {
    store: JobStore,
    extractor: Arc<dyn MediaExtractor>,
    cfg: VdmConfig,
    gate: Arc<Semaphore>,
    workers: Mutex<JoinSet<()>>,
}

/// A candidate must carry both a scheme and a host.
fn validate_candidate(raw: &str) -> Result<Url, String> {
    match Url::parse(raw) {
        Ok(url) if url.has_host() => Ok(url),
        Ok(_) => Err("URL has no host component".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

impl Scheduler {
    pub fn new(store: JobStore, extractor: Arc<dyn MediaExtractor>, cfg: VdmConfig) -> Self {
        let gate = Arc::new(Semaphore::new(cfg.max_concurrent_jobs.max(1)));
        Self {
            store,
            extractor,
            cfg,
            gate,
            workers: Mutex::new(JoinSet::new()),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Accepts a multiline block of raw URLs (one per line, blanks skipped)
    /// and dispatches one worker per valid candidate. Invalid candidates are
    /// reported individually and never abort the batch. Returns as soon as
    /// all jobs are created; no transfer is awaited.
    pub async fn submit(
        &self,
        raw_urls: &str,
        quality: &str,
        format: MediaFormat,
    ) -> Result<SubmitOutcome> {
        let mut outcome = SubmitOutcome::default();

        for line in raw_urls.lines() {
            let candidate = line.trim();
            if candidate.is_empty() {
                continue;
            }

            let url = match validate_candidate(candidate) {
                Ok(url) => url,
                Err(reason) => {
                    tracing::debug!(url = candidate, %reason, "rejected submission");
                    outcome.rejected.push(RejectedUrl {
                        url: candidate.to_string(),
                        reason,
                    });
                    continue;
                }
            };

            let job = NewJob {
                url: url.to_string(),
                quality: quality.to_string(),
                format,
                platform: platform::classify(candidate).to_string(),
            };
            let id = self.store.add_job(&job).await?;
            tracing::info!(job_id = id, url = %job.url, platform = %job.platform, "job created");

            self.dispatch(id).await;
            outcome.created.push(id);
        }

        Ok(outcome)
    }

    /// Spawns the worker task for a job. The admission permit is acquired
    /// inside the task, so dispatch itself never blocks.
    async fn dispatch(&self, id: JobId) {
        let store = self.store.clone();
        let extractor = Arc::clone(&self.extractor);
        let cfg = self.cfg.clone();
        let gate = Arc::clone(&self.gate);

        let mut workers = self.workers.lock().await;
        workers.spawn(async move {
            let _permit = match gate.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            if let Err(e) = worker::run_job(&store, extractor, &cfg, id).await {
                tracing::error!(job_id = id, error = %format!("{e:#}"), "worker aborted");
            }
        });
    }

    /// Jobs still in flight, newest first.
    pub async fn list_active(&self) -> Result<Vec<JobRecord>> {
        self.store.list_active().await
    }

    /// Completed jobs, most recently completed first.
    pub async fn list_completed(&self, limit: i64) -> Result<Vec<JobRecord>> {
        self.store.list_completed(limit).await
    }

    /// Snapshot of every job, newest first, for programmatic consumers.
    pub async fn list_all(&self) -> Result<Vec<JobRecord>> {
        self.store.list_all().await
    }

    pub async fn get_job(&self, id: JobId) -> Result<Option<JobRecord>> {
        self.store.get_job(id).await
    }

    /// Path of a finished artifact. Valid only for completed jobs whose file
    /// is still on disk.
    pub async fn job_file(&self, id: JobId) -> Result<PathBuf, FileAccessError> {
        let job = self
            .store
            .get_job(id)
            .await?
            .ok_or(FileAccessError::NotFound(id))?;

        if job.status != JobStatus::Completed {
            return Err(FileAccessError::NotReady(id));
        }
        let path = job
            .file_path
            .map(PathBuf::from)
            .ok_or(FileAccessError::Missing(id))?;
        if tokio::fs::metadata(&path).await.is_err() {
            return Err(FileAccessError::Missing(id));
        }
        Ok(path)
    }

    /// Waits until every dispatched worker has finished. Used by the CLI
    /// before exit and by tests.
    pub async fn wait_idle(&self) {
        let mut workers = self.workers.lock().await;
        while workers.join_next().await.is_some() {}
    }
}
