//! Boundary to the external media-extraction engine.
//!
//! The engine is a black box: given a URL and options it fetches media,
//! emits progress events, and returns the artifact path. `MediaExtractor`
//! is the seam the worker drives; production uses `YtDlpExtractor`, tests
//! substitute scripted fakes.

pub mod options;
pub mod ytdlp;

mod progress;

use std::fmt;
use std::path::PathBuf;

use tokio::sync::mpsc::UnboundedSender;

use crate::job_store::MediaFormat;

/// Metadata from the probe step. Everything is best-effort; a field the
/// engine doesn't know stays `None`.
#[derive(Debug, Clone, Default)]
pub struct ProbeMetadata {
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<i64>,
    /// Exact size if the engine knows it, otherwise its estimate.
    pub file_size: Option<i64>,
}

/// One transfer request handed to the engine.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    /// Output path template with the engine's `%(ext)s` placeholder, e.g.
    /// `/downloads/7_Some_Title.%(ext)s`.
    pub output_template: PathBuf,
    /// Raw quality selector as submitted ("best", "worst", or a height
    /// ceiling like "720p"); mapped by `options::format_selector`.
    pub quality: String,
    pub format: MediaFormat,
}

/// Events emitted by the engine while a transfer runs.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    /// Cumulative bytes transferred; total is present when the engine knows
    /// (or can estimate) the final size.
    Transferred {
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
    },
    /// Transfer finished, post-processing (audio extraction, remux) started.
    /// The artifact is not final yet.
    PostProcessing,
}

/// Error from the transfer step. Fatal to the job; the probe step uses plain
/// `anyhow` since its failure is recoverable.
#[derive(Debug)]
pub enum FetchError {
    /// The engine binary could not be started.
    Spawn(std::io::Error),
    /// The engine exited unsuccessfully.
    Engine { code: Option<i32>, detail: String },
    /// The engine exceeded the transfer timeout and was killed.
    TimedOut(u64),
    /// The engine reported success but no artifact was found on disk.
    NoArtifact,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Spawn(e) => write!(f, "could not start extraction engine: {}", e),
            FetchError::Engine { code, detail } => {
                let detail = if detail.is_empty() { "no output" } else { detail };
                match code {
                    Some(code) => write!(f, "extraction engine failed (exit {}): {}", code, detail),
                    None => write!(f, "extraction engine killed by signal: {}", detail),
                }
            }
            FetchError::TimedOut(secs) => {
                write!(f, "transfer timed out after {}s", secs)
            }
            FetchError::NoArtifact => {
                write!(f, "engine reported success but produced no artifact")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

/// The extraction capability the worker drives.
///
/// Both calls block; the worker runs them under `spawn_blocking` and consumes
/// events from its own task, keeping each job single-writer.
pub trait MediaExtractor: Send + Sync {
    /// Metadata-only probe; transfers nothing. Failure here is non-fatal to
    /// the job (the caller logs it and proceeds without metadata).
    fn probe(&self, url: &str) -> anyhow::Result<ProbeMetadata>;

    /// Performs the transfer, emitting progress on `events` at a reasonable
    /// cadence, and returns the final artifact path.
    fn fetch(
        &self,
        request: &FetchRequest,
        events: &UnboundedSender<FetchEvent>,
    ) -> Result<PathBuf, FetchError>;
}
