// src/ranking/mod.rs
//! Ranking pipeline: ingest → filter → score → rank.
//!
//! Stages are pure functions of their inputs plus `now`; the orchestration here
//! only wires them to a [`VideoSource`] and records telemetry.

pub mod filter;
pub mod rank;
pub mod scoring;

use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};

use crate::error::VideoError;
use crate::ingest::{self, types::VideoSource};
use crate::video::{FilterSpec, ScoredVideo, VideoCandidate, WeightSpec, DEFAULT_TOP_N};
pub use rank::RankKey;

/// Validated, immutable ranking parameters for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRequest {
    pub filter: FilterSpec,
    pub weights: WeightSpec,
    pub top_n: usize,
}

impl Default for RankingRequest {
    fn default() -> Self {
        Self {
            filter: FilterSpec::default(),
            weights: WeightSpec::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Short, non-reversible tag for logging user keywords.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Filter, score and rank an already ingested batch.
///
/// Duplicate ids are dropped first so a repeated upstream hit cannot skew
/// batch normalization.
pub fn run_pipeline(
    candidates: Vec<VideoCandidate>,
    req: &RankingRequest,
    now: DateTime<Utc>,
) -> Vec<ScoredVideo> {
    let t0 = Instant::now();
    let total = candidates.len();

    let kept = filter::apply(ingest::dedup_by_id(candidates), &req.filter, now);
    counter!("video_candidates_kept_total").increment(kept.len() as u64);
    let kept_len = kept.len();

    let scored = scoring::score_batch(kept, &req.weights, now);
    let ranked = rank::rank(
        scored,
        RankKey::for_trending_mode(req.filter.trending_mode),
        req.top_n,
    );

    histogram!("video_pipeline_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    tracing::debug!(
        target: "ranking",
        total,
        kept = kept_len,
        returned = ranked.len(),
        trending_mode = req.filter.trending_mode,
        "pipeline finished"
    );
    ranked
}

/// Keyword search ranked by quality score (or views/day in trending mode).
pub async fn rank_search(
    source: &dyn VideoSource,
    keyword: &str,
    req: &RankingRequest,
    now: DateTime<Utc>,
) -> Result<Vec<ScoredVideo>, VideoError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(VideoError::InvalidParameter("keyword must not be empty".into()));
    }
    counter!("video_search_requests_total", "mode" => "search").increment(1);
    tracing::info!(
        target: "ranking",
        kw = %anon_hash(keyword),
        top_n = req.top_n,
        source = source.name(),
        "search"
    );

    let candidates = ingest::fetch_search(source, keyword, &req.filter, now).await?;
    Ok(run_pipeline(candidates, req, now))
}

/// Trending chart through the same filter/score/rank stages.
pub async fn rank_trending(
    source: &dyn VideoSource,
    req: &RankingRequest,
    now: DateTime<Utc>,
) -> Result<Vec<ScoredVideo>, VideoError> {
    counter!("video_search_requests_total", "mode" => "trending").increment(1);
    tracing::info!(target: "ranking", top_n = req.top_n, source = source.name(), "trending");

    let candidates = ingest::fetch_trending(source, &req.filter).await?;
    Ok(run_pipeline(candidates, req, now))
}
