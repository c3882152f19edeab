//! Job write operations: create, metadata, progress, and terminal states.
//!
//! Every mutation is a single UPDATE so concurrent readers never observe a
//! torn record. The worker owning a job is its only writer.

use anyhow::Result;

use super::db::{unix_timestamp, JobStore};
use super::types::{JobId, JobStatus, MediaInfo, NewJob};

impl JobStore {
    /// Insert a new pending job. Metadata is filled in later by the worker's
    /// probe; progress starts at zero.
    pub async fn add_job(&self, new: &NewJob) -> Result<JobId> {
        let now = unix_timestamp();
        let row_id = sqlx::query(
            r#"
            INSERT INTO jobs (
                url, quality, format, status, progress,
                created_at, platform
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
            "#,
        )
        .bind(&new.url)
        .bind(&new.quality)
        .bind(new.format.as_str())
        .bind(JobStatus::Pending.as_str())
        .bind(now)
        .bind(&new.platform)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(row_id)
    }

    /// Update the lifecycle status of an existing job.
    pub async fn set_status(&self, id: JobId, status: JobStatus) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?1
            WHERE id = ?2
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Update the progress percentage (0..=100). Monotonicity is enforced by
    /// the worker; the store records whatever the single writer decides.
    pub async fn set_progress(&self, id: JobId, progress: f64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET progress = ?1
            WHERE id = ?2
            "#,
        )
        .bind(progress)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist metadata discovered by the probe.
    pub async fn update_media_info(&self, id: JobId, info: &MediaInfo) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET title = ?1,
                thumbnail_url = ?2,
                duration_secs = ?3,
                file_size = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&info.title)
        .bind(&info.thumbnail_url)
        .bind(info.duration_secs)
        .bind(info.file_size)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Terminal success: records the artifact path, the size measured from
    /// the actual file, pins progress to 100, and stamps completion time.
    pub async fn mark_completed(&self, id: JobId, file_path: &str, file_size: i64) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?1,
                progress = 100.0,
                file_path = ?2,
                file_size = ?3,
                completed_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(JobStatus::Completed.as_str())
        .bind(file_path)
        .bind(file_size)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Terminal failure: records the human-readable cause. Never retried.
    pub async fn mark_failed(&self, id: JobId, message: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?1,
                error_message = ?2
            WHERE id = ?3
            "#,
        )
        .bind(JobStatus::Failed.as_str())
        .bind(message)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
