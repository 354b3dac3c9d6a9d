//! Best-effort video transcript retrieval.
//!
//! Video links are not routed through the attachment dispatcher; callers
//! invoke this directly. Fetch failures never surface as errors, they
//! collapse into sentinel strings so a turn can keep going.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

/// Returned when no video id could be parsed out of the URL.
pub const NO_VIDEO_ID: &str = "[no video id found in url]";

/// Returned when the video exists but no transcript could be fetched.
pub const NO_TRANSCRIPT: &str = "[no transcript available for this video]";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

fn watch_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"v=([A-Za-z0-9_-]{11})").unwrap())
}

fn short_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"youtu\.be/([A-Za-z0-9_-]{11})").unwrap())
}

fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Pull an 11-character video id out of a watch or short-form URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    watch_pattern()
        .captures(url)
        .or_else(|| short_pattern().captures(url))
        .map(|caps| caps[1].to_string())
}

/// Fetch a caption track for the given URL.
///
/// Always returns text: either the transcript or one of the sentinel
/// strings above.
pub async fn fetch_video_transcript(url: &str) -> String {
    let Some(video_id) = extract_video_id(url) else {
        return NO_VIDEO_ID.to_string();
    };

    let endpoint = format!("https://video.google.com/timedtext?lang=en&v={}", video_id);
    let client = match reqwest::Client::builder().timeout(FETCH_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "failed to build transcript client");
            return NO_TRANSCRIPT.to_string();
        }
    };

    let body = match client.get(&endpoint).send().await {
        Ok(resp) if resp.status().is_success() => match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(video_id, error = %e, "transcript body read failed");
                return NO_TRANSCRIPT.to_string();
            }
        },
        Ok(resp) => {
            warn!(video_id, status = %resp.status(), "transcript fetch rejected");
            return NO_TRANSCRIPT.to_string();
        }
        Err(e) => {
            warn!(video_id, error = %e, "transcript fetch failed");
            return NO_TRANSCRIPT.to_string();
        }
    };

    let transcript = strip_caption_markup(&body);
    if transcript.is_empty() {
        debug!(video_id, "empty caption track");
        NO_TRANSCRIPT.to_string()
    } else {
        transcript
    }
}

/// Drop XML tags from a caption track and unescape the common entities.
fn strip_caption_markup(body: &str) -> String {
    let stripped = tag_pattern().replace_all(body, " ");
    stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_id_from_watch_url() {
        let id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_extract_id_from_short_url() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=42");
        assert_eq!(id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_extract_id_rejects_plain_text() {
        assert_eq!(extract_video_id("just some words"), None);
        assert_eq!(extract_video_id("https://example.com/watch?v=short"), None);
    }

    #[test]
    fn test_strip_caption_markup() {
        let body = r#"<transcript><text start="0.0">hello &amp; welcome</text>
<text start="2.1">to the show</text></transcript>"#;
        assert_eq!(strip_caption_markup(body), "hello & welcome to the show");
    }

    #[tokio::test]
    async fn test_no_id_sentinel() {
        let out = fetch_video_transcript("not a url at all").await;
        assert_eq!(out, NO_VIDEO_ID);
    }
}
