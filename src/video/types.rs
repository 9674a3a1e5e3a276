// src/video/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_shorts, parse_iso8601_duration, truncate_chars, watch_url, DESCRIPTION_MAX_CHARS};

/// A video as ingested from the upstream platform. Immutable for the rest of the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoCandidate {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub description: String,
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    /// ISO-8601 display string, e.g. `PT4M13S`.
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub duration_seconds: u64,
    /// Declared language (`defaultAudioLanguage` / `defaultLanguage`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub is_shorts: bool,
}

impl VideoCandidate {
    /// Fill derived fields: watch URL, seconds from the ISO duration, shorts flag,
    /// and the description cap.
    pub fn with_derived(mut self) -> Self {
        if self.url.is_empty() {
            self.url = watch_url(&self.video_id);
        }
        if self.duration_seconds == 0 {
            self.duration_seconds = parse_iso8601_duration(&self.duration).unwrap_or(0);
        }
        if self.duration.is_empty() {
            self.duration = format!("PT{}S", self.duration_seconds);
        }
        self.description = truncate_chars(&self.description, DESCRIPTION_MAX_CHARS);
        self.is_shorts = is_shorts(self.duration_seconds, &self.title);
        self
    }

    /// Whole days since publish, floored and never negative.
    pub fn days_ago(&self, now: DateTime<Utc>) -> i64 {
        (now - self.published_at).num_days().max(0)
    }
}

/// A candidate that survived filtering, with its scores attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredVideo {
    #[serde(flatten)]
    pub video: VideoCandidate,
    /// Composite 0–100.
    pub quality_score: f64,
    /// Display value (whole number).
    pub views_per_day: f64,
    pub days_ago: i64,
    /// (likes + comments) / views in percent.
    pub engagement_rate: f64,
    /// Unrounded views per day; trending sort key.
    #[serde(skip)]
    pub(crate) views_per_day_exact: f64,
}

impl ScoredVideo {
    pub fn video_id(&self) -> &str {
        &self.video.video_id
    }

    pub fn view_count(&self) -> u64 {
        self.video.view_count
    }
}
