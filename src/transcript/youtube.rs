// src/transcript/youtube.rs
//! Captions via the public watch page: the player response embeds
//! `"captionTracks": [...]`, each with a `baseUrl` serving timedtext XML.

use std::time::Duration;

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::TranscriptError;
use crate::transcript::{CaptionTrack, Segment, TranscriptSource};

pub const DEFAULT_WATCH_BASE: &str = "https://www.youtube.com";

const CAPTION_TRACKS_KEY: &str = "\"captionTracks\":";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<RawName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<RawRun>,
}

#[derive(Debug, Deserialize)]
struct RawRun {
    text: String,
}

impl RawTrack {
    fn into_track(self) -> CaptionTrack {
        let name = self
            .name
            .and_then(|n| {
                n.simple_text.or_else(|| {
                    let joined: String = n.runs.into_iter().map(|r| r.text).collect();
                    (!joined.is_empty()).then_some(joined)
                })
            })
            .unwrap_or_else(|| self.language_code.clone());
        CaptionTrack {
            is_generated: self.kind.as_deref() == Some("asr"),
            language_code: self.language_code,
            name,
            base_url: self.base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(rename = "text", default)]
    lines: Vec<TimedLine>,
}

#[derive(Debug, Deserialize)]
struct TimedLine {
    #[serde(rename = "@start")]
    start: f64,
    #[serde(rename = "@dur", default)]
    dur: f64,
    #[serde(rename = "$text", default)]
    text: String,
}

/// Slice the JSON array that follows `"captionTracks":`, honoring strings.
fn caption_tracks_json(html: &str) -> Option<&str> {
    let start = html.find(CAPTION_TRACKS_KEY)? + CAPTION_TRACKS_KEY.len();
    let rest = &html[start..];
    let open = rest.find('[')?;
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escaped = false;
    for (i, ch) in rest[open..].char_indices() {
        if in_str {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_str = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_str = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[open..open + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse caption tracks out of a watch page.
pub fn parse_watch_page(video_id: &str, html: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    let Some(raw) = caption_tracks_json(html) else {
        let unplayable = html.contains("\"playabilityStatus\":{\"status\":\"ERROR\"")
            || html.contains("\"status\":\"LOGIN_REQUIRED\"");
        return Err(if unplayable {
            TranscriptError::VideoUnavailable(video_id.to_string())
        } else {
            TranscriptError::Disabled
        });
    };
    let tracks: Vec<RawTrack> =
        serde_json::from_str(raw).map_err(|e| TranscriptError::Malformed(format!("captionTracks: {e}")))?;
    Ok(tracks.into_iter().map(RawTrack::into_track).collect())
}

/// Parse a timedtext XML body into segments. Entities are decoded twice since
/// the payload often carries `&amp;#39;`.
pub fn parse_timedtext(xml: &str) -> Result<Vec<Segment>, TranscriptError> {
    let doc: TimedText =
        from_str(xml).map_err(|e| TranscriptError::Malformed(format!("timedtext: {e}")))?;
    Ok(doc
        .lines
        .into_iter()
        .map(|l| Segment {
            start: l.start,
            duration: l.dur,
            text: html_escape::decode_html_entities(&l.text)
                .replace('\n', " ")
                .trim()
                .to_string(),
        })
        .filter(|s| !s.text.is_empty())
        .collect())
}

pub struct WatchPageTranscripts {
    http: reqwest::Client,
    base: String,
}

impl WatchPageTranscripts {
    pub fn new(base: impl Into<String>) -> Result<Self, TranscriptError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TranscriptSource for WatchPageTranscripts {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
        let resp = self
            .http
            .get(format!("{}/watch", self.base))
            .query(&[("v", video_id)])
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.8")
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TranscriptError::VideoUnavailable(video_id.to_string()));
        }
        let html = resp.error_for_status()?.text().await?;
        parse_watch_page(video_id, &html)
    }

    async fn fetch_segments(&self, track: &CaptionTrack) -> Result<Vec<Segment>, TranscriptError> {
        let xml = self
            .http
            .get(&track.base_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_timedtext(&xml)
    }

    fn name(&self) -> &'static str {
        "youtube-watch"
    }
}
