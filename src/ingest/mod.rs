// src/ingest/mod.rs
//! Ingestion: pull raw candidates from a [`VideoSource`], derive display fields,
//! and drop duplicate ids before the ranking stages run.

pub mod providers;
pub mod types;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::config::app::AppConfig;
use crate::error::VideoError;
use crate::video::{FilterSpec, VideoCandidate};
use providers::{FixtureSource, YouTubeSource};
use types::VideoSource;

/// Env switch for the offline source.
pub const VIDEO_SOURCE_ENV: &str = "VIDEO_SOURCE";
pub const VIDEO_FIXTURE_PATH_ENV: &str = "VIDEO_FIXTURE_PATH";

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "video_search_requests_total",
            "Ranking requests by mode (search/trending)."
        );
        describe_counter!(
            "video_candidates_ingested_total",
            "Candidates returned by the upstream source."
        );
        describe_counter!(
            "video_candidates_kept_total",
            "Candidates surviving the filter stage."
        );
        describe_counter!(
            "video_upstream_errors_total",
            "Upstream source fetch/parse errors."
        );
        describe_histogram!("video_pipeline_ms", "Filter+score+rank time in milliseconds.");
        describe_histogram!("youtube_request_ms", "YouTube Data API round-trip in milliseconds.");
    });
}

/// First occurrence of each `video_id` wins; order is preserved.
pub fn dedup_by_id(candidates: Vec<VideoCandidate>) -> Vec<VideoCandidate> {
    let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.video_id.clone()))
        .collect()
}

fn finish(source: &dyn VideoSource, raw: Vec<VideoCandidate>) -> Vec<VideoCandidate> {
    counter!("video_candidates_ingested_total").increment(raw.len() as u64);
    let out = dedup_by_id(raw.into_iter().map(VideoCandidate::with_derived).collect());
    tracing::debug!(target: "ingest", source = source.name(), count = out.len(), "candidates ingested");
    out
}

/// Keyword search through the source.
pub async fn fetch_search(
    source: &dyn VideoSource,
    keyword: &str,
    filter: &FilterSpec,
    now: DateTime<Utc>,
) -> Result<Vec<VideoCandidate>, VideoError> {
    ensure_metrics_described();
    match source.search(keyword, filter, now).await {
        Ok(raw) => Ok(finish(source, raw)),
        Err(e) => {
            tracing::warn!(target: "ingest", error = %e, source = source.name(), "search failed");
            Err(e)
        }
    }
}

/// Trending chart through the source.
pub async fn fetch_trending(
    source: &dyn VideoSource,
    filter: &FilterSpec,
) -> Result<Vec<VideoCandidate>, VideoError> {
    ensure_metrics_described();
    match source.trending(filter).await {
        Ok(raw) => Ok(finish(source, raw)),
        Err(e) => {
            tracing::warn!(target: "ingest", error = %e, source = source.name(), "trending failed");
            Err(e)
        }
    }
}

/// Pick the video source: `VIDEO_SOURCE=fixture` loads `VIDEO_FIXTURE_PATH`,
/// anything else talks to YouTube with the configured key.
pub fn build_source(cfg: &AppConfig) -> anyhow::Result<Arc<dyn VideoSource>> {
    let wants_fixture = std::env::var(VIDEO_SOURCE_ENV)
        .map(|v| v.eq_ignore_ascii_case("fixture"))
        .unwrap_or(false);
    if wants_fixture {
        let path = std::env::var(VIDEO_FIXTURE_PATH_ENV)
            .map_err(|_| anyhow::anyhow!("{VIDEO_FIXTURE_PATH_ENV} must be set when {VIDEO_SOURCE_ENV}=fixture"))?;
        tracing::info!(target: "ingest", %path, "using fixture video source");
        return Ok(Arc::new(FixtureSource::from_path(&path)?));
    }

    let yt = YouTubeSource::new(&cfg.youtube)?;
    if !yt.is_configured() {
        tracing::warn!(target: "ingest", "YOUTUBE_API_KEY missing; video endpoints will fail");
    }
    Ok(Arc::new(yt))
}
