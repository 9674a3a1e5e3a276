// src/ranking/filter.rs
//! Filter stage: keep candidates satisfying every active constraint (logical AND).

use chrono::{DateTime, Utc};

use crate::video::{FilterSpec, VideoCandidate};

/// Does one candidate pass every active constraint?
pub fn keep(c: &VideoCandidate, spec: &FilterSpec, now: DateTime<Utc>) -> bool {
    if !spec.shorts.keeps(c.is_shorts) {
        return false;
    }
    if !spec.duration.contains(c.duration_seconds) {
        return false;
    }
    if let Some(window) = spec.upload_period.window() {
        if now - c.published_at > window {
            return false;
        }
    }
    if !spec.language.matches(c.language.as_deref()) {
        return false;
    }
    c.view_count >= spec.min_views
}

/// Apply the filter, preserving input order. An empty result is not an error.
pub fn apply(
    candidates: Vec<VideoCandidate>,
    spec: &FilterSpec,
    now: DateTime<Utc>,
) -> Vec<VideoCandidate> {
    candidates
        .into_iter()
        .filter(|c| keep(c, spec, now))
        .collect()
}
