//! yt-dlp-backed extractor.
//!
//! Shells out to the yt-dlp binary: the probe uses `-J` (JSON metadata, no
//! transfer), the fetch streams `--newline` output and forwards progress
//! events. Both steps bound the subprocess with a kill-on-deadline poll.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::VdmConfig;
use crate::job_store::MediaFormat;

use super::options::format_selector;
use super::progress::{parse_line, EngineLine, PROGRESS_TEMPLATE};
use super::{FetchError, FetchEvent, FetchRequest, MediaExtractor, ProbeMetadata};

/// How many trailing stderr lines are kept for error reporting.
const STDERR_TAIL_LINES: usize = 30;

/// Extractor driving the yt-dlp binary.
pub struct YtDlpExtractor {
    bin: String,
    probe_timeout: Duration,
    transfer_timeout: Duration,
}

impl YtDlpExtractor {
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            probe_timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(3600),
        }
    }

    pub fn from_config(cfg: &VdmConfig) -> Self {
        Self {
            bin: cfg.ytdlp_bin.clone(),
            probe_timeout: Duration::from_secs(cfg.probe_timeout_secs),
            transfer_timeout: Duration::from_secs(cfg.transfer_timeout_secs),
        }
    }
}

/// Subset of yt-dlp's `-J` output we care about.
#[derive(Debug, Deserialize)]
struct RawProbe {
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    filesize: Option<i64>,
    filesize_approx: Option<f64>,
}

impl From<RawProbe> for ProbeMetadata {
    fn from(raw: RawProbe) -> Self {
        ProbeMetadata {
            title: raw.title,
            thumbnail_url: raw.thumbnail,
            duration_secs: raw.duration.map(|d| d.round() as i64),
            file_size: raw
                .filesize
                .or_else(|| raw.filesize_approx.map(|v| v as i64)),
        }
    }
}

/// Builds the argument list for one transfer.
pub(crate) fn build_fetch_args(request: &FetchRequest) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-o".into(),
        request.output_template.to_string_lossy().into_owned(),
        "--newline".into(),
        "--no-playlist".into(),
        "--no-warnings".into(),
        "--progress-template".into(),
        PROGRESS_TEMPLATE.into(),
        "-f".into(),
        format_selector(&request.quality),
    ];

    if request.format.is_audio() {
        for arg in ["--extract-audio", "--audio-format", "mp3", "--audio-quality", "0"] {
            args.push(arg.into());
        }
    } else {
        args.push("--remux-video".into());
        args.push(request.format.as_str().into());
    }

    args.push(request.url.clone());
    args
}

/// Poll until the child exits or the deadline passes. On timeout the child
/// is killed and reaped, and None is returned.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(200));
    }
}

/// Drains stderr on its own thread, keeping the last few lines for error
/// messages. Reading concurrently with stdout avoids a full-pipe stall.
fn spawn_stderr_tail(stderr: Option<ChildStderr>) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let Some(stderr) = stderr else {
            return String::new();
        };
        let mut tail: VecDeque<String> = VecDeque::new();
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            tracing::debug!("engine: {}", line);
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        tail.into_iter().collect::<Vec<_>>().join("\n")
    })
}

/// Locates the artifact by its template stem when the engine never named it
/// (the real extension is only known after the transfer).
fn resolve_artifact(template: &Path, format: MediaFormat) -> Option<PathBuf> {
    let dir = template.parent()?;
    let file = template.file_name()?.to_str()?;
    let stem = file.strip_suffix(".%(ext)s")?;

    let preferred = dir.join(format!("{}.{}", stem, format.as_str()));
    if preferred.exists() {
        return Some(preferred);
    }

    let prefix = format!("{}.", stem);
    for entry in std::fs::read_dir(dir).ok()?.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(&prefix)
            && !name.ends_with(".part")
            && !name.ends_with(".ytdl")
            && !name.ends_with(".temp")
        {
            return Some(entry.path());
        }
    }
    None
}

impl MediaExtractor for YtDlpExtractor {
    fn probe(&self, url: &str) -> Result<ProbeMetadata> {
        let mut child = Command::new(&self.bin)
            .args(["-J", "--no-playlist", "--no-warnings"])
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("spawn extraction engine for probe")?;

        // Read stdout off-thread so a large JSON document can't fill the
        // pipe while we wait on the process.
        let stdout = child.stdout.take();
        let json_handle = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut out) = stdout {
                let _ = out.read_to_string(&mut buf);
            }
            buf
        });
        let stderr_handle = spawn_stderr_tail(child.stderr.take());

        let status = wait_with_deadline(&mut child, self.probe_timeout)
            .context("wait for probe process")?;
        let json = json_handle.join().unwrap_or_default();
        let stderr_text = stderr_handle.join().unwrap_or_default();

        let Some(status) = status else {
            anyhow::bail!("probe timed out after {}s", self.probe_timeout.as_secs());
        };
        if !status.success() {
            anyhow::bail!("probe failed (exit {:?}): {}", status.code(), stderr_text);
        }

        let raw: RawProbe = serde_json::from_str(&json).context("parse probe JSON")?;
        Ok(raw.into())
    }

    fn fetch(
        &self,
        request: &FetchRequest,
        events: &UnboundedSender<FetchEvent>,
    ) -> Result<PathBuf, FetchError> {
        let args = build_fetch_args(request);
        tracing::debug!(url = %request.url, "starting engine transfer");

        let mut child = Command::new(&self.bin)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(FetchError::Spawn)?;

        let stderr_handle = spawn_stderr_tail(child.stderr.take());

        let mut destination: Option<PathBuf> = None;
        let mut post_destination: Option<PathBuf> = None;
        let mut post_processing = false;

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                match parse_line(&line) {
                    Some(EngineLine::Progress {
                        downloaded_bytes,
                        total_bytes,
                    }) => {
                        let _ = events.send(FetchEvent::Transferred {
                            downloaded_bytes,
                            total_bytes,
                        });
                    }
                    Some(EngineLine::Destination(path)) => destination = Some(path),
                    Some(EngineLine::PostProcessing { destination: path }) => {
                        if path.is_some() {
                            post_destination = path;
                        }
                        if !post_processing {
                            post_processing = true;
                            let _ = events.send(FetchEvent::PostProcessing);
                        }
                    }
                    None => {}
                }
            }
        }

        let status = match wait_with_deadline(&mut child, self.transfer_timeout) {
            Ok(Some(status)) => status,
            Ok(None) => return Err(FetchError::TimedOut(self.transfer_timeout.as_secs())),
            Err(e) => {
                return Err(FetchError::Engine {
                    code: None,
                    detail: format!("wait for engine process: {}", e),
                })
            }
        };
        let stderr_text = stderr_handle.join().unwrap_or_default();

        if !status.success() {
            return Err(FetchError::Engine {
                code: status.code(),
                detail: stderr_text,
            });
        }

        // Post-processing output wins over the raw transfer destination; as
        // a last resort scan for the template stem with any extension.
        post_destination
            .or(destination)
            .filter(|p| p.exists())
            .or_else(|| resolve_artifact(&request.output_template, request.format))
            .ok_or(FetchError::NoArtifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: MediaFormat, quality: &str) -> FetchRequest {
        FetchRequest {
            url: "https://youtube.com/watch?v=abc".to_string(),
            output_template: PathBuf::from("/downloads/3_clip.%(ext)s"),
            quality: quality.to_string(),
            format,
        }
    }

    #[test]
    fn audio_format_switches_to_extraction_mode() {
        let args = build_fetch_args(&request(MediaFormat::Mp3, "best"));
        assert!(args.iter().any(|a| a == "--extract-audio"));
        assert!(args.windows(2).any(|w| w[0] == "--audio-format" && w[1] == "mp3"));
        assert!(!args.iter().any(|a| a == "--remux-video"));
    }

    #[test]
    fn video_format_requests_container_remux() {
        let args = build_fetch_args(&request(MediaFormat::Webm, "best"));
        assert!(args.windows(2).any(|w| w[0] == "--remux-video" && w[1] == "webm"));
        assert!(!args.iter().any(|a| a == "--extract-audio"));
    }

    #[test]
    fn quality_ceiling_reaches_selector() {
        let args = build_fetch_args(&request(MediaFormat::Mp4, "720p"));
        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "best[height<=720]"));
    }

    #[test]
    fn url_is_last_argument() {
        let args = build_fetch_args(&request(MediaFormat::Mp4, "best"));
        assert_eq!(args.last().map(String::as_str), Some("https://youtube.com/watch?v=abc"));
    }

    #[test]
    fn probe_json_maps_to_metadata() {
        let json = r#"{
            "title": "A Video",
            "duration": 212.4,
            "thumbnail": "https://example.com/t.jpg",
            "filesize": null,
            "filesize_approx": 1048576.0,
            "uploader": "ignored"
        }"#;
        let raw: RawProbe = serde_json::from_str(json).unwrap();
        let meta = ProbeMetadata::from(raw);
        assert_eq!(meta.title.as_deref(), Some("A Video"));
        assert_eq!(meta.duration_secs, Some(212));
        assert_eq!(meta.thumbnail_url.as_deref(), Some("https://example.com/t.jpg"));
        assert_eq!(meta.file_size, Some(1_048_576));
    }

    #[test]
    fn resolve_artifact_prefers_requested_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("3_clip.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("3_clip.webm"), b"x").unwrap();

        let template = dir.path().join("3_clip.%(ext)s");
        let found = resolve_artifact(&template, MediaFormat::Mp4).unwrap();
        assert_eq!(found, dir.path().join("3_clip.mp4"));
    }

    #[test]
    fn resolve_artifact_skips_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("3_clip.mp4.part"), b"x").unwrap();

        let template = dir.path().join("3_clip.%(ext)s");
        assert!(resolve_artifact(&template, MediaFormat::Mp4).is_none());
    }

    #[test]
    fn resolve_artifact_accepts_other_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("3_clip.mkv"), b"x").unwrap();

        let template = dir.path().join("3_clip.%(ext)s");
        let found = resolve_artifact(&template, MediaFormat::Mp4).unwrap();
        assert_eq!(found, dir.path().join("3_clip.mkv"));
    }
}
