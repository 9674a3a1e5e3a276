// src/ingest/providers/youtube.rs
//! YouTube Data API v3 source: `search.list` for ids, `videos.list` for snippet,
//! statistics and duration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::config::app::YouTubeConfig;
use crate::error::VideoError;
use crate::ingest::types::VideoSource;
use crate::video::{FilterSpec, VideoCandidate};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Upstream errors with these reasons are reported as quota exhaustion.
const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"];

/// Region + relevance language used for a requested language code.
pub fn region_for_language(code: &str) -> Option<(&'static str, &'static str)> {
    match code.to_ascii_lowercase().as_str() {
        "ko" => Some(("KR", "ko")),
        "en" => Some(("US", "en")),
        "ja" => Some(("JP", "ja")),
        "zh" | "zh-hans" | "zh-cn" => Some(("CN", "zh-Hans")),
        _ => None,
    }
}

// ---- wire shapes ----

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    published_at: DateTime<Utc>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
    default_audio_language: Option<String>,
    default_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Counts arrive as decimal strings; hidden counts are absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.parse::<u64>().ok()).unwrap_or(0)
}

impl VideoItem {
    fn into_candidate(self) -> VideoCandidate {
        let thumbnail = ["high", "medium", "default"]
            .iter()
            .find_map(|k| self.snippet.thumbnails.get(*k))
            .map(|t| t.url.clone())
            .unwrap_or_default();
        VideoCandidate {
            url: String::new(),
            thumbnail,
            title: self.snippet.title,
            channel_title: self.snippet.channel_title,
            published_at: self.snippet.published_at,
            description: self.snippet.description,
            view_count: parse_count(self.statistics.view_count.as_deref()),
            like_count: parse_count(self.statistics.like_count.as_deref()),
            comment_count: parse_count(self.statistics.comment_count.as_deref()),
            duration: self.content_details.duration,
            duration_seconds: 0,
            language: self
                .snippet
                .default_audio_language
                .or(self.snippet.default_language),
            is_shorts: false,
            video_id: self.id,
        }
        .with_derived()
    }
}

/// HTTP client for the YouTube Data API.
pub struct YouTubeSource {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    max_results: usize,
    default_region: String,
    default_relevance_language: String,
}

impl YouTubeSource {
    pub fn new(cfg: &YouTubeConfig) -> Result<Self, VideoError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("content-planner/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            max_results: cfg.max_results,
            default_region: cfg.default_region.clone(),
            default_relevance_language: cfg.default_relevance_language.clone(),
        })
    }

    fn require_key(&self) -> Result<&str, VideoError> {
        if self.api_key.is_empty() {
            Err(VideoError::NotConfigured("YOUTUBE_API_KEY"))
        } else {
            Ok(&self.api_key)
        }
    }

    fn region_and_language(&self, filter: &FilterSpec) -> (String, String) {
        filter
            .language
            .code()
            .and_then(region_for_language)
            .map(|(r, l)| (r.to_string(), l.to_string()))
            .unwrap_or_else(|| {
                (
                    self.default_region.clone(),
                    self.default_relevance_language.clone(),
                )
            })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, VideoError> {
        let key = self.require_key()?;
        let url = format!("{}/{}", self.api_base, endpoint);
        let t0 = Instant::now();
        let resp = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", key)])
            .send()
            .await?;
        histogram!("youtube_request_ms", "endpoint" => endpoint.to_string())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }
        resp.json::<T>()
            .await
            .map_err(|e| VideoError::Malformed(format!("{endpoint}: {e}")))
    }

    async fn videos_by_id(&self, ids: &[String]) -> Result<Vec<VideoCandidate>, VideoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let body: VideosResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,statistics,contentDetails".to_string()),
                    ("id", ids.join(",")),
                ],
            )
            .await?;

        let mut by_id: HashMap<String, VideoItem> =
            body.items.into_iter().map(|v| (v.id.clone(), v)).collect();
        // Keep search order; hits without details are dropped.
        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(VideoItem::into_candidate)
            .collect())
    }
}

fn upstream_error(status: u16, body: &str) -> VideoError {
    counter!("video_upstream_errors_total", "source" => "youtube").increment(1);
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => {
            let quota = env
                .error
                .errors
                .iter()
                .any(|e| QUOTA_REASONS.contains(&e.reason.as_str()));
            if quota {
                VideoError::QuotaExceeded(env.error.message)
            } else {
                VideoError::Upstream {
                    status,
                    message: env.error.message,
                }
            }
        }
        Err(_) => VideoError::Upstream {
            status,
            message: body.chars().take(200).collect(),
        },
    }
}

#[async_trait]
impl VideoSource for YouTubeSource {
    async fn search(
        &self,
        keyword: &str,
        filter: &FilterSpec,
        now: DateTime<Utc>,
    ) -> Result<Vec<VideoCandidate>, VideoError> {
        let (region, lang) = self.region_and_language(filter);
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("order", "viewCount".to_string()),
            ("maxResults", self.max_results.min(50).to_string()),
            ("q", keyword.to_string()),
            ("regionCode", region),
            ("relevanceLanguage", lang),
        ];
        if let Some(d) = filter.duration.upstream_param() {
            params.push(("videoDuration", d.to_string()));
        }
        if let Some(window) = filter.upload_period.window() {
            let after = (now - window).to_rfc3339_opts(SecondsFormat::Secs, true);
            params.push(("publishedAfter", after));
        }

        let found: SearchResponse = self.get_json("search", &params).await?;
        let ids: Vec<String> = found
            .items
            .into_iter()
            .filter_map(|it| it.id.video_id)
            .collect();
        self.videos_by_id(&ids).await
    }

    async fn trending(&self, filter: &FilterSpec) -> Result<Vec<VideoCandidate>, VideoError> {
        let (region, _) = self.region_and_language(filter);
        let body: VideosResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,statistics,contentDetails".to_string()),
                    ("chart", "mostPopular".to_string()),
                    ("regionCode", region),
                    ("maxResults", self.max_results.min(50).to_string()),
                ],
            )
            .await?;
        Ok(body
            .items
            .into_iter()
            .map(VideoItem::into_candidate)
            .collect())
    }

    fn name(&self) -> &'static str {
        "youtube"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_region_mapping() {
        assert_eq!(region_for_language("ko"), Some(("KR", "ko")));
        assert_eq!(region_for_language("zh"), Some(("CN", "zh-Hans")));
        assert_eq!(region_for_language("fr"), None);
    }

    #[test]
    fn quota_reason_is_detected() {
        let body = r#"{"error":{"code":403,"message":"The request cannot be completed because you have exceeded your quota.","errors":[{"reason":"quotaExceeded"}]}}"#;
        assert!(matches!(
            upstream_error(403, body),
            VideoError::QuotaExceeded(_)
        ));
    }

    #[test]
    fn non_json_error_body_is_kept_short() {
        let body = "x".repeat(1000);
        match upstream_error(500, &body) {
            VideoError::Upstream { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.len(), 200);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn video_item_maps_to_candidate() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "snippet": {
                "publishedAt": "2024-05-01T10:00:00Z",
                "title": "Rust in 100 seconds",
                "channelTitle": "Fireship",
                "description": "fast",
                "thumbnails": {"default": {"url": "d.jpg"}, "high": {"url": "h.jpg"}},
                "defaultAudioLanguage": "en"
            },
            "statistics": {"viewCount": "1500", "likeCount": "120"},
            "contentDetails": {"duration": "PT2M10S"}
        }"#;
        let item: VideoItem = serde_json::from_str(json).unwrap();
        let c = item.into_candidate();
        assert_eq!(c.video_id, "dQw4w9WgXcQ");
        assert_eq!(c.thumbnail, "h.jpg");
        assert_eq!(c.view_count, 1500);
        assert_eq!(c.comment_count, 0);
        assert_eq!(c.duration_seconds, 130);
        assert_eq!(c.language.as_deref(), Some("en"));
        assert!(!c.is_shorts);
        assert_eq!(c.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
