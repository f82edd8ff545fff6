use regex::Regex;
use std::sync::OnceLock;

static VIDEO_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

fn video_id_pattern() -> &'static Regex {
    VIDEO_ID_PATTERN.get_or_init(|| {
        Regex::new(r"/watch(?:\?|.*?&)v=([^&]+)").expect("valid video id pattern")
    })
}

/// Extract the canonical video id from a watch-page URL.
///
/// Accepts `v` as the first query parameter or anywhere after other
/// parameters, with or without trailing parameters. Returns `None` for any
/// URL without the pattern; most links on a listing page are not video links
/// and that is not an error.
pub fn extract_video_id(url: &str) -> Option<&str> {
    video_id_pattern()
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}
