// src/transcript/mod.rs
//! Caption extraction for a single video.
//!
//! A [`TranscriptSource`] lists caption tracks and downloads one track's
//! segments; everything else here (id parsing, language preference, formatting)
//! is pure.

pub mod youtube;

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;

use crate::error::TranscriptError;

pub use youtube::WatchPageTranscripts;

/// Language used when the caller does not ask for one.
pub const DEFAULT_LANGUAGE: &str = "ko";

/// One caption track advertised for a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub name: String,
    pub is_generated: bool,
    /// Where the track body can be fetched from.
    pub base_url: String,
}

/// One timed caption line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Transcript {
    pub video_id: String,
    pub language: String,
    pub is_generated: bool,
    pub text: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AvailableLanguages {
    pub video_id: String,
    pub manual_captions: Vec<LanguageInfo>,
    pub auto_generated: Vec<LanguageInfo>,
}

#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, TranscriptError>;

    async fn fetch_segments(&self, track: &CaptionTrack) -> Result<Vec<Segment>, TranscriptError>;

    fn name(&self) -> &'static str;
}

/// Pull the 11-character id out of a watch/short/embed/youtu.be URL.
/// Bare ids and unrecognized input are returned trimmed.
pub fn extract_video_id(url_or_id: &str) -> String {
    let s = url_or_id.trim();
    if s.len() == 11 && !s.starts_with("http") {
        return s.to_string();
    }

    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"(?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)([A-Za-z0-9_-]{11})",
        )
        .unwrap()
    });
    re.captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| s.to_string())
}

/// Preferred track languages for a requested language, most preferred first.
pub fn language_priority(lang: &str) -> Vec<&'static str> {
    match lang.to_ascii_lowercase().as_str() {
        "ko" => vec!["ko", "en", "ja"],
        "en" => vec!["en", "ko", "ja"],
        "ja" => vec!["ja", "ko", "en"],
        "zh" => vec!["zh-Hans", "zh-Hant", "ko", "en"],
        _ => vec!["ko", "en"],
    }
}

/// Walk the priority list; within one language a manual track beats a generated one.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], priority: &[&str]) -> Option<&'a CaptionTrack> {
    priority.iter().find_map(|lang| {
        let same_lang = |t: &&CaptionTrack| t.language_code.eq_ignore_ascii_case(lang);
        tracks
            .iter()
            .filter(same_lang)
            .find(|t| !t.is_generated)
            .or_else(|| tracks.iter().find(same_lang))
    })
}

fn mmss(start: f64) -> String {
    let total = start.max(0.0) as u64;
    format!("[{:02}:{:02}]", total / 60, total % 60)
}

/// Timestamped lines (`[mm:ss] text`, newline separated) or a single space-joined text.
pub fn format_segments(segments: &[Segment], timestamps: bool) -> String {
    if timestamps {
        segments
            .iter()
            .map(|s| format!("{} {}", mmss(s.start), s.text))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Resolve a track for `lang` and render it.
pub async fn fetch_transcript(
    source: &dyn TranscriptSource,
    url_or_id: &str,
    lang: &str,
    timestamps: bool,
) -> Result<Transcript, TranscriptError> {
    let video_id = extract_video_id(url_or_id);
    let tracks = source.list_tracks(&video_id).await?;
    if tracks.is_empty() {
        return Err(TranscriptError::Disabled);
    }

    let priority = language_priority(lang);
    let track = select_track(&tracks, &priority).ok_or_else(|| {
        TranscriptError::NoTranscript(priority.iter().map(|s| s.to_string()).collect())
    })?;

    let segments = source.fetch_segments(track).await?;
    let text = format_segments(&segments, timestamps);
    tracing::debug!(
        target: "transcript",
        video_id = %video_id,
        language = %track.language_code,
        generated = track.is_generated,
        segments = segments.len(),
        "transcript fetched"
    );
    Ok(Transcript {
        word_count: word_count(&text),
        video_id,
        language: track.language_code.clone(),
        is_generated: track.is_generated,
        text,
    })
}

/// Split advertised tracks into manual and auto-generated lists.
pub async fn available_languages(
    source: &dyn TranscriptSource,
    url_or_id: &str,
) -> Result<AvailableLanguages, TranscriptError> {
    let video_id = extract_video_id(url_or_id);
    let tracks = source.list_tracks(&video_id).await?;
    let (auto, manual): (Vec<_>, Vec<_>) = tracks.into_iter().partition(|t| t.is_generated);
    let info = |t: CaptionTrack| LanguageInfo {
        code: t.language_code,
        name: t.name,
    };
    Ok(AvailableLanguages {
        video_id,
        manual_captions: manual.into_iter().map(info).collect(),
        auto_generated: auto.into_iter().map(info).collect(),
    })
}

/// Canned tracks keyed by video id. Used for offline runs and tests.
#[derive(Default)]
pub struct InMemoryTranscripts {
    videos: HashMap<String, Vec<(CaptionTrack, Vec<Segment>)>>,
}

impl InMemoryTranscripts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(
        mut self,
        video_id: &str,
        language_code: &str,
        is_generated: bool,
        segments: Vec<Segment>,
    ) -> Self {
        let track = CaptionTrack {
            language_code: language_code.to_string(),
            name: language_code.to_string(),
            is_generated,
            base_url: format!("memory://{video_id}/{language_code}/{is_generated}"),
        };
        self.videos
            .entry(video_id.to_string())
            .or_default()
            .push((track, segments));
        self
    }
}

#[async_trait::async_trait]
impl TranscriptSource for InMemoryTranscripts {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
        self.videos
            .get(video_id)
            .map(|v| v.iter().map(|(t, _)| t.clone()).collect())
            .ok_or_else(|| TranscriptError::VideoUnavailable(video_id.to_string()))
    }

    async fn fetch_segments(&self, track: &CaptionTrack) -> Result<Vec<Segment>, TranscriptError> {
        self.videos
            .values()
            .flatten()
            .find(|(t, _)| t.base_url == track.base_url)
            .map(|(_, s)| s.clone())
            .ok_or_else(|| TranscriptError::Malformed(format!("unknown track {}", track.base_url)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
