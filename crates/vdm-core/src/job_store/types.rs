//! Types used by the job database.

use serde::{Deserialize, Serialize};

/// Job identifier.
pub type JobId = i64;

/// Job lifecycle state, stored as a string in the database.
///
/// `Completed` and `Failed` are terminal; a job never leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Downloading,
    Converting,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Downloading => "downloading",
            JobStatus::Converting => "converting",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parses the stored string form. Returns `None` for anything else, so
    /// the persistence boundary can reject corrupt rows instead of guessing.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "downloading" => Some(JobStatus::Downloading),
            "converting" => Some(JobStatus::Converting),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Pending, downloading, or converting.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

/// Requested output format, stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Mp4,
    Mp3,
    Webm,
    Avi,
}

impl MediaFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaFormat::Mp4 => "mp4",
            MediaFormat::Mp3 => "mp3",
            MediaFormat::Webm => "webm",
            MediaFormat::Avi => "avi",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mp4" => Some(MediaFormat::Mp4),
            "mp3" => Some(MediaFormat::Mp3),
            "webm" => Some(MediaFormat::Webm),
            "avi" => Some(MediaFormat::Avi),
            _ => None,
        }
    }

    /// True when the format requires audio extraction instead of a container
    /// remux.
    pub fn is_audio(self) -> bool {
        matches!(self, MediaFormat::Mp3)
    }
}

/// Fields required to create a job. Everything else starts empty.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub url: String,
    pub quality: String,
    pub format: MediaFormat,
    pub platform: String,
}

/// Metadata discovered by the probe, persisted opportunistically before the
/// transfer starts.
#[derive(Debug, Clone, Default)]
pub struct MediaInfo {
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<i64>,
    pub file_size: Option<i64>,
}

/// Full job record as stored. Serializes for the data-export surface.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: JobId,
    pub url: String,
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<i64>,
    pub file_size: Option<i64>,
    pub quality: String,
    pub format: MediaFormat,
    pub status: JobStatus,
    pub progress: f64,
    pub file_path: Option<String>,
    pub error_message: Option<String>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub platform: String,
}
