//! Mapping from requested options to engine parameters: quality selector,
//! filesystem-safe output naming.

use std::path::{Path, PathBuf};

use crate::job_store::JobId;

/// Stem used when a job has no usable title.
const DEFAULT_STEM: &str = "video";

/// Longest sanitized title kept in a filename, in bytes.
const MAX_STEM_LEN: usize = 150;

/// Maps the submitted quality selector to the engine's format selector.
///
/// "best" and "worst" pass through unchanged. Anything else is read as a
/// maximum-height constraint: the numeric prefix is taken and trailing unit
/// characters ("720p" -> 720) are stripped. A selector with no numeric
/// prefix falls back to "best".
pub fn format_selector(quality: &str) -> String {
    match quality {
        "best" | "worst" => quality.to_string(),
        other => {
            let digits: String = other.chars().take_while(|c| c.is_ascii_digit()).collect();
            match digits.parse::<u32>() {
                Ok(height) if height > 0 => format!("best[height<={}]", height),
                _ => {
                    tracing::warn!(quality = other, "unrecognized quality selector, using best");
                    "best".to_string()
                }
            }
        }
    }
}

/// Sanitizes a media title into a filesystem-safe filename stem.
///
/// Keeps ASCII alphanumerics and underscores, collapses whitespace/hyphen
/// runs to a single underscore, and drops everything else. Bounded to
/// `MAX_STEM_LEN` bytes on a char boundary.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut prev_underscore = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            prev_underscore = false;
        } else if c.is_whitespace() || c == '-' || c == '_' {
            if !prev_underscore && !out.is_empty() {
                out.push('_');
            }
            prev_underscore = true;
        }
        // Anything else is stripped.
    }

    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        return DEFAULT_STEM.to_string();
    }

    if trimmed.len() > MAX_STEM_LEN {
        let mut take = MAX_STEM_LEN;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].trim_end_matches('_').to_string()
    } else {
        trimmed.to_string()
    }
}

/// Deterministic output-path template for a job: `<dir>/<id>_<stem>.%(ext)s`.
///
/// The job id prefix keeps templates unique even when two jobs share a
/// title; the engine substitutes the actual extension.
pub fn output_template(download_dir: &Path, id: JobId, title: Option<&str>) -> PathBuf {
    let stem = sanitize_title(title.unwrap_or(DEFAULT_STEM));
    download_dir.join(format!("{}_{}.%(ext)s", id, stem))
}
