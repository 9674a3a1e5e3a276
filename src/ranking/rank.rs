// src/ranking/rank.rs
//! Ranking stage: sort by the active key, break ties, truncate.
//!
//! Order:
//! - active key descending (`quality_score`, or exact views/day in trending mode)
//! - then higher `view_count`
//! - then earlier `published_at` (proven content beats a brand-new upload)
//! - then `video_id` ascending, so the order is total and repeatable

use std::cmp::Ordering;

use crate::video::ScoredVideo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKey {
    QualityScore,
    ViewsPerDay,
}

impl RankKey {
    pub fn for_trending_mode(trending_mode: bool) -> Self {
        if trending_mode {
            RankKey::ViewsPerDay
        } else {
            RankKey::QualityScore
        }
    }

    fn value(self, v: &ScoredVideo) -> f64 {
        match self {
            RankKey::QualityScore => v.quality_score,
            RankKey::ViewsPerDay => v.views_per_day_exact,
        }
    }
}

/// Total order used by [`rank`]. `Less` means `a` is placed before `b`.
pub fn compare(a: &ScoredVideo, b: &ScoredVideo, key: RankKey) -> Ordering {
    key.value(b)
        .total_cmp(&key.value(a))
        .then_with(|| b.video.view_count.cmp(&a.video.view_count))
        .then_with(|| a.video.published_at.cmp(&b.video.published_at))
        .then_with(|| a.video.video_id.cmp(&b.video.video_id))
}

/// Sort and keep the first `top_n`.
pub fn rank(mut items: Vec<ScoredVideo>, key: RankKey, top_n: usize) -> Vec<ScoredVideo> {
    items.sort_by(|a, b| compare(a, b, key));
    items.truncate(top_n);
    items
}

/// 1-based positions matching the final order. Rank is positional, not stored.
pub fn positions(items: &[ScoredVideo]) -> impl Iterator<Item = (usize, &ScoredVideo)> {
    items.iter().enumerate().map(|(i, v)| (i + 1, v))
}
