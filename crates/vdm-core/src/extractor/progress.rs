//! Parsing of the engine's `--newline` output stream.
//!
//! Progress comes from our own `--progress-template` marker lines (exact
//! byte counts, "NA" when the engine doesn't know a value); destination and
//! post-processing markers come from the engine's standard output lines.

use std::path::PathBuf;

/// Template passed to the engine so progress lines carry machine-readable
/// byte counts: downloaded, total, total-estimate.
pub(crate) const PROGRESS_TEMPLATE: &str =
    "download:[vdm-progress] %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s";

/// One recognized line of engine output.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EngineLine {
    Progress {
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
    },
    /// Transfer target path announced before bytes start flowing.
    Destination(PathBuf),
    /// Post-processing (audio extraction, merge) started; carries the final
    /// artifact path when the line names one.
    PostProcessing { destination: Option<PathBuf> },
}

/// The engine prints "NA" for values it doesn't know; estimates can be
/// floats.
fn parse_count(token: &str) -> Option<u64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

/// Parses one line of engine output; returns None for anything we don't
/// track (format listings, warnings, throttle notices).
pub(crate) fn parse_line(line: &str) -> Option<EngineLine> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("[vdm-progress]") {
        let mut tokens = rest.split_whitespace();
        let downloaded_bytes = parse_count(tokens.next()?)?;
        let total = tokens.next().and_then(parse_count);
        let estimate = tokens.next().and_then(parse_count);
        return Some(EngineLine::Progress {
            downloaded_bytes,
            total_bytes: total.or(estimate),
        });
    }

    if let Some(rest) = line.strip_prefix("[download] Destination: ") {
        return Some(EngineLine::Destination(PathBuf::from(rest)));
    }

    if let Some(rest) = line.strip_prefix("[ExtractAudio] Destination: ") {
        return Some(EngineLine::PostProcessing {
            destination: Some(PathBuf::from(rest)),
        });
    }
    if line.starts_with("[ExtractAudio]") {
        return Some(EngineLine::PostProcessing { destination: None });
    }

    if let Some(rest) = line.strip_prefix("[Merger] Merging formats into \"") {
        return rest.strip_suffix('"').map(|p| EngineLine::PostProcessing {
            destination: Some(PathBuf::from(p)),
        });
    }
    if line.starts_with("[Merger]") {
        return Some(EngineLine::PostProcessing { destination: None });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_with_known_total() {
        assert_eq!(
            parse_line("[vdm-progress] 512 2048 NA"),
            Some(EngineLine::Progress {
                downloaded_bytes: 512,
                total_bytes: Some(2048),
            })
        );
    }

    #[test]
    fn progress_falls_back_to_estimate() {
        assert_eq!(
            parse_line("[vdm-progress] 512 NA 4096.0"),
            Some(EngineLine::Progress {
                downloaded_bytes: 512,
                total_bytes: Some(4096),
            })
        );
    }

    #[test]
    fn progress_with_unknown_total() {
        assert_eq!(
            parse_line("[vdm-progress] 512 NA NA"),
            Some(EngineLine::Progress {
                downloaded_bytes: 512,
                total_bytes: None,
            })
        );
    }

    #[test]
    fn progress_without_downloaded_count_is_skipped() {
        assert_eq!(parse_line("[vdm-progress] NA NA NA"), None);
    }

    #[test]
    fn destination_line() {
        assert_eq!(
            parse_line("[download] Destination: /downloads/3_clip.mp4"),
            Some(EngineLine::Destination(PathBuf::from(
                "/downloads/3_clip.mp4"
            )))
        );
    }

    #[test]
    fn extract_audio_marks_post_processing() {
        assert_eq!(
            parse_line("[ExtractAudio] Destination: /downloads/3_clip.mp3"),
            Some(EngineLine::PostProcessing {
                destination: Some(PathBuf::from("/downloads/3_clip.mp3")),
            })
        );
        assert_eq!(
            parse_line("[ExtractAudio] Not converting audio; file is already in target format"),
            Some(EngineLine::PostProcessing { destination: None })
        );
    }

    #[test]
    fn merger_marks_post_processing() {
        assert_eq!(
            parse_line("[Merger] Merging formats into \"/downloads/3_clip.mp4\""),
            Some(EngineLine::PostProcessing {
                destination: Some(PathBuf::from("/downloads/3_clip.mp4")),
            })
        );
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        assert_eq!(parse_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_line("WARNING: something minor"), None);
        assert_eq!(parse_line(""), None);
    }
}
