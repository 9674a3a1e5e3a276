// src/ingest/providers/fixture.rs
//! Offline source backed by a JSON array of candidates. Used by tests and by
//! `VIDEO_SOURCE=fixture` for local runs without an API key.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::VideoError;
use crate::ingest::types::VideoSource;
use crate::video::{FilterSpec, VideoCandidate};

pub struct FixtureSource {
    videos: Vec<VideoCandidate>,
    /// When set every call fails with this upstream message.
    failure: Option<String>,
}

impl FixtureSource {
    pub fn new(videos: Vec<VideoCandidate>) -> Self {
        Self {
            videos,
            failure: None,
        }
    }

    pub fn from_fixture(json: &str) -> Result<Self, VideoError> {
        let videos: Vec<VideoCandidate> = serde_json::from_str(json)
            .map_err(|e| VideoError::Malformed(format!("fixture: {e}")))?;
        Ok(Self::new(videos))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, VideoError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| VideoError::Malformed(format!("fixture {}: {e}", path.display())))?;
        Self::from_fixture(&raw)
    }

    /// A source whose upstream is down.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            videos: Vec::new(),
            failure: Some(message.into()),
        }
    }

    fn check(&self) -> Result<(), VideoError> {
        match &self.failure {
            Some(msg) => Err(VideoError::Upstream {
                status: 503,
                message: msg.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn matches_keyword(v: &VideoCandidate, keyword: &str) -> bool {
    let words: Vec<String> = keyword
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    if words.is_empty() {
        return true;
    }
    let hay = format!("{} {}", v.title, v.description).to_lowercase();
    words.iter().any(|w| hay.contains(w.as_str()))
}

#[async_trait]
impl VideoSource for FixtureSource {
    async fn search(
        &self,
        keyword: &str,
        _filter: &FilterSpec,
        _now: DateTime<Utc>,
    ) -> Result<Vec<VideoCandidate>, VideoError> {
        self.check()?;
        Ok(self
            .videos
            .iter()
            .filter(|v| matches_keyword(v, keyword))
            .cloned()
            .collect())
    }

    async fn trending(&self, _filter: &FilterSpec) -> Result<Vec<VideoCandidate>, VideoError> {
        self.check()?;
        Ok(self.videos.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {"video_id":"aaaaaaaaaaa","title":"Rust async tutorial","channel_title":"c",
         "published_at":"2025-05-01T00:00:00Z","view_count":100,"duration":"PT10M"},
        {"video_id":"bbbbbbbbbbb","title":"Cooking pasta","channel_title":"c",
         "published_at":"2025-05-01T00:00:00Z","view_count":50,"duration":"PT30S"}
    ]"#;

    #[tokio::test]
    async fn keyword_match_is_case_insensitive() {
        let src = FixtureSource::from_fixture(FIXTURE).unwrap();
        let out = src
            .search("RUST", &FilterSpec::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].video_id, "aaaaaaaaaaa");
    }

    #[tokio::test]
    async fn trending_returns_everything() {
        let src = FixtureSource::from_fixture(FIXTURE).unwrap();
        assert_eq!(src.trending(&FilterSpec::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unavailable_source_errors() {
        let src = FixtureSource::unavailable("down");
        let err = src.trending(&FilterSpec::default()).await.unwrap_err();
        assert!(matches!(err, VideoError::Upstream { status: 503, .. }));
    }

    #[test]
    fn bad_fixture_is_malformed() {
        assert!(matches!(
            FixtureSource::from_fixture("{not json"),
            Err(VideoError::Malformed(_))
        ));
    }
}
