//! Job read operations: get and the list views used by the query surface.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::db::JobStore;
use super::types::{JobId, JobRecord, JobStatus, MediaFormat};

/// Maps a row to a record, rejecting unknown status/format strings rather
/// than coercing them.
fn record_from_row(row: &SqliteRow) -> Result<JobRecord> {
    let status_str: String = row.get("status");
    let status = JobStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("unknown job status in store: {status_str:?}"))?;
    let format_str: String = row.get("format");
    let format = MediaFormat::parse(&format_str)
        .ok_or_else(|| anyhow::anyhow!("unknown media format in store: {format_str:?}"))?;

    Ok(JobRecord {
        id: row.get("id"),
        url: row.get("url"),
        title: row.get("title"),
        thumbnail_url: row.get("thumbnail_url"),
        duration_secs: row.get("duration_secs"),
        file_size: row.get("file_size"),
        quality: row.get("quality"),
        format,
        status,
        progress: row.get("progress"),
        file_path: row.get("file_path"),
        error_message: row.get("error_message"),
        created_at: row.get("created_at"),
        completed_at: row.get("completed_at"),
        platform: row.get("platform"),
    })
}

const SELECT_COLUMNS: &str = r#"
    id, url, title, thumbnail_url, duration_secs, file_size,
    quality, format, status, progress, file_path, error_message,
    created_at, completed_at, platform
"#;

impl JobStore {
    /// Fetch a single job, or None if the id is unknown.
    pub async fn get_job(&self, id: JobId) -> Result<Option<JobRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM jobs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    /// Jobs still in flight (pending, downloading, converting), newest first
    /// by creation time.
    pub async fn list_active(&self) -> Result<Vec<JobRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM jobs
            WHERE status IN ('pending', 'downloading', 'converting')
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Completed jobs, most recently completed first.
    pub async fn list_completed(&self, limit: i64) -> Result<Vec<JobRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM jobs
            WHERE status = 'completed'
            ORDER BY completed_at DESC, id DESC
            LIMIT ?1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Every job in the store, newest first. Used by the data-export surface.
    pub async fn list_all(&self) -> Result<Vec<JobRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM jobs
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }
}
