// src/ranking/scoring.rs
//! Scoring stage: batch-normalized sub-scores blended into the 0–100 quality score.
//!
//! `ScoreInputs` are three normalized signals in [0,1]:
//! - `view_score`       : views relative to the most viewed candidate in the batch
//! - `engagement_score` : engagement rate relative to the best rate in the batch
//! - `recency_score`    : 1.0 for today, falling linearly to 0.0 at one year
//!
//! quality = 100 * (w_v*views + w_e*engagement + w_r*recency) / (w_v + w_e + w_r)

use chrono::{DateTime, Utc};

use crate::video::{ScoredVideo, VideoCandidate, WeightSpec};

/// Engagement rate is capped here (percent).
pub const ENGAGEMENT_RATE_CAP: f64 = 100.0;

/// Age at which the recency sub-score reaches zero.
pub const RECENCY_HORIZON_DAYS: f64 = 365.0;

/// Normalized inputs in [0,1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreInputs {
    pub view_score: f64,
    pub engagement_score: f64,
    pub recency_score: f64,
}

impl ScoreInputs {
    /// Safe constructor with clamping.
    pub fn new(views: f64, engagement: f64, recency: f64) -> Self {
        fn c(x: f64) -> f64 {
            if x.is_nan() {
                0.0
            } else {
                x.clamp(0.0, 1.0)
            }
        }
        Self {
            view_score: c(views),
            engagement_score: c(engagement),
            recency_score: c(recency),
        }
    }
}

/// Weighted blend in [0,1]. Zero weights fall back to equal thirds.
pub fn composite(inputs: &ScoreInputs, w: &WeightSpec) -> f64 {
    let (wv, we, wr) = w.normalized();
    let raw = inputs.view_score * wv + inputs.engagement_score * we + inputs.recency_score * wr;
    raw.clamp(0.0, 1.0)
}

/// (likes + comments) / views in percent, capped.
pub fn engagement_rate(c: &VideoCandidate) -> f64 {
    let interactions = c.like_count.saturating_add(c.comment_count) as f64;
    let views = c.view_count.max(1) as f64;
    (interactions * 100.0 / views).min(ENGAGEMENT_RATE_CAP)
}

/// Monotonic decreasing in age.
pub fn recency_score(days_ago: i64) -> f64 {
    (1.0 - days_ago as f64 / RECENCY_HORIZON_DAYS).clamp(0.0, 1.0)
}

/// Views divided by days since publish, days floored at 1.
pub fn views_per_day(view_count: u64, days_ago: i64) -> f64 {
    view_count as f64 / days_ago.max(1) as f64
}

fn ratio_to_max(x: f64, max: f64) -> f64 {
    if max > 0.0 {
        x / max
    } else {
        0.0
    }
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

/// Score a filtered batch. Normalization is relative to this batch only.
pub fn score_batch(
    candidates: Vec<VideoCandidate>,
    weights: &WeightSpec,
    now: DateTime<Utc>,
) -> Vec<ScoredVideo> {
    let rates: Vec<f64> = candidates.iter().map(engagement_rate).collect();
    let max_views = candidates.iter().map(|c| c.view_count).max().unwrap_or(0) as f64;
    let max_rate = rates.iter().copied().fold(0.0_f64, f64::max);

    candidates
        .into_iter()
        .zip(rates)
        .map(|(video, rate)| {
            let days_ago = video.days_ago(now);
            let inputs = ScoreInputs::new(
                ratio_to_max(video.view_count as f64, max_views),
                ratio_to_max(rate, max_rate),
                recency_score(days_ago),
            );
            let vpd = views_per_day(video.view_count, days_ago);
            ScoredVideo {
                quality_score: round_to(composite(&inputs, weights) * 100.0, 2),
                views_per_day: vpd.round(),
                days_ago,
                engagement_rate: round_to(rate, 2),
                views_per_day_exact: vpd,
                video,
            }
        })
        .collect()
}
