//! Source-platform classification from the URL host.
//!
//! The label is display-only; it never influences how a job is executed.

use url::Url;

/// Label used when the host matches no known platform (or the URL is
/// malformed).
pub const OTHER: &str = "Other";

/// Ordered substring rules against the lower-cased host; first match wins.
const RULES: &[(&[&str], &str)] = &[
    (&["youtube.com", "youtu.be"], "YouTube"),
    (&["instagram.com"], "Instagram"),
    (&["twitter.com", "x.com"], "Twitter/X"),
    (&["tiktok.com"], "TikTok"),
    (&["facebook.com", "fb.watch"], "Facebook"),
    (&["vimeo.com"], "Vimeo"),
    (&["dailymotion.com"], "Dailymotion"),
    (&["twitch.tv"], "Twitch"),
    (&["reddit.com"], "Reddit"),
    (&["t.me", "telegram.org"], "Telegram"),
];

/// Maps a URL to its source-platform label.
///
/// Pure function over the URL's host component, case-insensitive. Unknown
/// hosts and unparsable input yield `"Other"`; this never panics.
pub fn classify(url: &str) -> &'static str {
    let host = match Url::parse(url) {
        Ok(u) => match u.host_str() {
            Some(h) => h.to_ascii_lowercase(),
            None => return OTHER,
        },
        Err(_) => return OTHER,
    };

    for (patterns, label) in RULES {
        if patterns.iter().any(|p| host.contains(p)) {
            return label;
        }
    }
    OTHER
}
