//! Tests for job_store (use in-memory DB helper from db).

use crate::job_store::db::open_memory;
use crate::job_store::{JobStatus, MediaFormat, MediaInfo, NewJob};

fn new_job(url: &str) -> NewJob {
    NewJob {
        url: url.to_string(),
        quality: "best".to_string(),
        format: MediaFormat::Mp4,
        platform: "Other".to_string(),
    }
}

#[tokio::test]
async fn add_and_get_defaults() {
    let store = open_memory().await.unwrap();
    let id = store
        .add_job(&new_job("https://youtube.com/watch?v=abc"))
        .await
        .unwrap();

    let job = store.get_job(id).await.unwrap().expect("job exists");
    assert_eq!(job.id, id);
    assert_eq!(job.url, "https://youtube.com/watch?v=abc");
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.format, MediaFormat::Mp4);
    assert_eq!(job.progress, 0.0);
    assert_eq!(job.title, None);
    assert_eq!(job.file_path, None);
    assert_eq!(job.error_message, None);
    assert_eq!(job.completed_at, None);
    assert!(job.created_at > 0);
}

#[tokio::test]
async fn get_unknown_id_is_none() {
    let store = open_memory().await.unwrap();
    assert!(store.get_job(42).await.unwrap().is_none());
}

#[tokio::test]
async fn status_and_progress_updates() {
    let store = open_memory().await.unwrap();
    let id = store.add_job(&new_job("https://example.com/v")).await.unwrap();

    store.set_status(id, JobStatus::Downloading).await.unwrap();
    store.set_progress(id, 25.0).await.unwrap();
    let job = store.get_job(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Downloading);
    assert_eq!(job.progress, 25.0);

    store.set_status(id, JobStatus::Converting).await.unwrap();
    let job = store.get_job(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Converting);
}

#[tokio::test]
async fn media_info_persisted() {
    let store = open_memory().await.unwrap();
    let id = store.add_job(&new_job("https://example.com/v")).await.unwrap();

    let info = MediaInfo {
        title: Some("A Video".to_string()),
        thumbnail_url: Some("https://example.com/t.jpg".to_string()),
        duration_secs: Some(212),
        file_size: Some(1_000_000),
    };
    store.update_media_info(id, &info).await.unwrap();

    let job = store.get_job(id).await.unwrap().unwrap();
    assert_eq!(job.title.as_deref(), Some("A Video"));
    assert_eq!(job.thumbnail_url.as_deref(), Some("https://example.com/t.jpg"));
    assert_eq!(job.duration_secs, Some(212));
    assert_eq!(job.file_size, Some(1_000_000));
}

#[tokio::test]
async fn mark_completed_pins_progress_and_stamps_time() {
    let store = open_memory().await.unwrap();
    let id = store.add_job(&new_job("https://example.com/v")).await.unwrap();
    store.set_progress(id, 99.0).await.unwrap();

    store
        .mark_completed(id, "/tmp/1_video.mp4", 2048)
        .await
        .unwrap();

    let job = store.get_job(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100.0);
    assert_eq!(job.file_path.as_deref(), Some("/tmp/1_video.mp4"));
    assert_eq!(job.file_size, Some(2048));
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn mark_failed_records_cause() {
    let store = open_memory().await.unwrap();
    let id = store.add_job(&new_job("https://example.com/v")).await.unwrap();

    store.mark_failed(id, "network unreachable").await.unwrap();

    let job = store.get_job(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("network unreachable"));
    assert_eq!(job.file_path, None);
}

#[tokio::test]
async fn list_active_excludes_terminal_and_orders_newest_first() {
    let store = open_memory().await.unwrap();
    let a = store.add_job(&new_job("https://a.com/1")).await.unwrap();
    let b = store.add_job(&new_job("https://b.com/2")).await.unwrap();
    let c = store.add_job(&new_job("https://c.com/3")).await.unwrap();

    store.mark_failed(a, "boom").await.unwrap();
    store.set_status(b, JobStatus::Downloading).await.unwrap();

    let active = store.list_active().await.unwrap();
    let ids: Vec<_> = active.iter().map(|j| j.id).collect();
    // Same creation second; falls back to id DESC.
    assert_eq!(ids, vec![c, b]);
}

#[tokio::test]
async fn list_completed_orders_by_completion_and_limits() {
    let store = open_memory().await.unwrap();
    let mut ids = Vec::new();
    for i in 0..3 {
        let id = store
            .add_job(&new_job(&format!("https://example.com/{i}")))
            .await
            .unwrap();
        store
            .mark_completed(id, &format!("/tmp/{id}.mp4"), 1)
            .await
            .unwrap();
        ids.push(id);
    }

    let completed = store.list_completed(10).await.unwrap();
    assert_eq!(completed.len(), 3);
    // Same completion second; falls back to id DESC.
    assert_eq!(completed[0].id, ids[2]);

    let limited = store.list_completed(2).await.unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn list_all_returns_every_job_newest_first() {
    let store = open_memory().await.unwrap();
    let a = store.add_job(&new_job("https://a.com/1")).await.unwrap();
    let b = store.add_job(&new_job("https://b.com/2")).await.unwrap();
    store.mark_failed(a, "x").await.unwrap();

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, b);
    assert_eq!(all[1].id, a);
}

#[tokio::test]
async fn unknown_status_string_is_rejected_at_read() {
    let store = open_memory().await.unwrap();
    let id = store.add_job(&new_job("https://example.com/v")).await.unwrap();

    sqlx::query("UPDATE jobs SET status = 'paused' WHERE id = ?1")
        .bind(id)
        .execute(&store.pool)
        .await
        .unwrap();

    assert!(store.get_job(id).await.is_err());
}
