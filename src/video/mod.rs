// src/video/mod.rs
//! Video data model: ingested candidates, scored results and the per-request
//! filter/weight parameters.

pub mod spec;
pub mod types;

use once_cell::sync::OnceCell;
use regex::Regex;

pub use spec::{
    validate_top_n, DurationBucket, FilterSpec, LanguageFilter, ShortsMode, UploadPeriod,
    WeightSpec, DEFAULT_TOP_N, MAX_SEARCH_TOP_N, MAX_TRENDING_TOP_N,
};
pub use types::{ScoredVideo, VideoCandidate};

/// Videos at or below this length count as shorts.
pub const SHORTS_MAX_SECONDS: u64 = 60;

/// Description is cut to this many chars at ingestion.
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Title tags that mark an upload as short-form, matched case-insensitively.
const SHORTS_TAGS: [&str; 2] = ["#shorts", "#쇼츠"];

/// Short-form detection: duration threshold or a shorts tag in the title.
pub fn is_shorts(duration_seconds: u64, title: &str) -> bool {
    if duration_seconds <= SHORTS_MAX_SECONDS {
        return true;
    }
    let title = title.to_lowercase();
    SHORTS_TAGS.iter().any(|tag| title.contains(tag))
}

/// Parse an ISO-8601 duration as reported by the platform (`PT1H2M3S`, `P1DT2H`, `P0D`).
/// Returns `None` when the string is not a duration.
pub fn parse_iso8601_duration(raw: &str) -> Option<u64> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .expect("duration regex")
    });
    let caps = re.captures(raw.trim())?;
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    Some(part(1) * 86_400 + part(2) * 3_600 + part(3) * 60 + part(4))
}

/// Cut a string to at most `max` chars (not bytes).
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
