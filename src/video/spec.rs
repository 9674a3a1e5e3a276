// src/video/spec.rs
//! Request-scoped filter and weight parameters, parsed from the wire strings.
//!
//! Every parser rejects unknown values with `VideoError::InvalidParameter`;
//! nothing is silently coerced.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::VideoError;

pub const DEFAULT_TOP_N: usize = 10;
pub const MAX_SEARCH_TOP_N: usize = 50;
pub const MAX_TRENDING_TOP_N: usize = 30;

/// Which short-form videos to keep. One mode per request, never "both".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortsMode {
    #[default]
    All,
    ShortsOnly,
    ExcludeShorts,
}

impl ShortsMode {
    /// Normalize the wire's two booleans into a single mode.
    pub fn from_flags(shorts_only: bool, exclude_shorts: bool) -> Result<Self, VideoError> {
        match (shorts_only, exclude_shorts) {
            (true, true) => Err(VideoError::InvalidParameter(
                "shorts_only and exclude_shorts are mutually exclusive".into(),
            )),
            (true, false) => Ok(ShortsMode::ShortsOnly),
            (false, true) => Ok(ShortsMode::ExcludeShorts),
            (false, false) => Ok(ShortsMode::All),
        }
    }

    pub fn keeps(self, is_shorts: bool) -> bool {
        match self {
            ShortsMode::All => true,
            ShortsMode::ShortsOnly => is_shorts,
            ShortsMode::ExcludeShorts => !is_shorts,
        }
    }
}

/// Length buckets. Thresholds are fixed: short < 4 min, medium 4–20 min, long > 20 min.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationBucket {
    #[default]
    Any,
    Short,
    Medium,
    Long,
}

impl DurationBucket {
    pub const SHORT_BELOW_SECS: u64 = 240;
    pub const LONG_ABOVE_SECS: u64 = 1200;

    pub fn contains(self, seconds: u64) -> bool {
        match self {
            DurationBucket::Any => true,
            DurationBucket::Short => seconds < Self::SHORT_BELOW_SECS,
            DurationBucket::Medium => {
                (Self::SHORT_BELOW_SECS..=Self::LONG_ABOVE_SECS).contains(&seconds)
            }
            DurationBucket::Long => seconds > Self::LONG_ABOVE_SECS,
        }
    }

    /// Value for the upstream `videoDuration` search parameter.
    pub fn upstream_param(self) -> Option<&'static str> {
        match self {
            DurationBucket::Any => None,
            DurationBucket::Short => Some("short"),
            DurationBucket::Medium => Some("medium"),
            DurationBucket::Long => Some("long"),
        }
    }
}

impl FromStr for DurationBucket {
    type Err = VideoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "any" | "" => Ok(DurationBucket::Any),
            "short" => Ok(DurationBucket::Short),
            "medium" => Ok(DurationBucket::Medium),
            "long" => Ok(DurationBucket::Long),
            other => Err(VideoError::InvalidParameter(format!(
                "duration_filter must be one of any, short, medium, long (got '{other}')"
            ))),
        }
    }
}

/// Rolling upload window measured back from request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPeriod {
    #[default]
    Any,
    Day,
    Week,
    Month,
    Year,
}

impl UploadPeriod {
    pub fn window(self) -> Option<Duration> {
        match self {
            UploadPeriod::Any => None,
            UploadPeriod::Day => Some(Duration::hours(24)),
            UploadPeriod::Week => Some(Duration::days(7)),
            UploadPeriod::Month => Some(Duration::days(30)),
            UploadPeriod::Year => Some(Duration::days(365)),
        }
    }
}

impl FromStr for UploadPeriod {
    type Err = VideoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "any" | "" => Ok(UploadPeriod::Any),
            "day" => Ok(UploadPeriod::Day),
            "week" => Ok(UploadPeriod::Week),
            "month" => Ok(UploadPeriod::Month),
            "year" => Ok(UploadPeriod::Year),
            other => Err(VideoError::InvalidParameter(format!(
                "upload_period must be one of any, day, week, month, year (got '{other}')"
            ))),
        }
    }
}

/// `any` or a language code such as `ko`, `en`, `zh-Hans`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LanguageFilter {
    #[default]
    Any,
    Code(String),
}

impl LanguageFilter {
    /// Primary subtag comparison, case-insensitive. Undeclared languages never match a code.
    pub fn matches(&self, declared: Option<&str>) -> bool {
        match self {
            LanguageFilter::Any => true,
            LanguageFilter::Code(want) => declared
                .map(|d| primary_subtag(d) == primary_subtag(want))
                .unwrap_or(false),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            LanguageFilter::Any => None,
            LanguageFilter::Code(c) => Some(c.as_str()),
        }
    }
}

fn primary_subtag(code: &str) -> String {
    code.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

impl FromStr for LanguageFilter {
    type Err = VideoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("any") {
            return Ok(LanguageFilter::Any);
        }
        let well_formed = s.len() <= 16
            && s.split('-').all(|part| {
                !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric())
            });
        if !well_formed {
            return Err(VideoError::InvalidParameter(format!(
                "language must be 'any' or a language code like 'en' (got '{s}')"
            )));
        }
        Ok(LanguageFilter::Code(s.to_string()))
    }
}

impl fmt::Display for LanguageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageFilter::Any => f.write_str("any"),
            LanguageFilter::Code(c) => f.write_str(c),
        }
    }
}

/// Hard constraints applied before scoring.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub shorts: ShortsMode,
    pub duration: DurationBucket,
    pub upload_period: UploadPeriod,
    pub language: LanguageFilter,
    pub min_views: u64,
    /// Rank by views per day instead of the composite score.
    pub trending_mode: bool,
}

/// Client-adjustable weights, each in `[0, 100]`. Need not sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightSpec {
    pub views: u8,
    pub engagement: u8,
    pub recency: u8,
}

impl Default for WeightSpec {
    fn default() -> Self {
        Self {
            views: 35,
            engagement: 40,
            recency: 25,
        }
    }
}

impl WeightSpec {
    pub fn new(views: u32, engagement: u32, recency: u32) -> Result<Self, VideoError> {
        fn check(name: &str, v: u32) -> Result<u8, VideoError> {
            u8::try_from(v)
                .ok()
                .filter(|w| *w <= 100)
                .ok_or_else(|| {
                    VideoError::InvalidParameter(format!("{name} must be within 0..=100 (got {v})"))
                })
        }
        Ok(Self {
            views: check("views_weight", views)?,
            engagement: check("engagement_weight", engagement)?,
            recency: check("recency_weight", recency)?,
        })
    }

    /// Fractions summing to 1.0; all-zero weights fall back to equal thirds.
    pub fn normalized(&self) -> (f64, f64, f64) {
        let sum = f64::from(self.views) + f64::from(self.engagement) + f64::from(self.recency);
        if sum <= 0.0 {
            let third = 1.0 / 3.0;
            return (third, third, third);
        }
        (
            f64::from(self.views) / sum,
            f64::from(self.engagement) / sum,
            f64::from(self.recency) / sum,
        )
    }
}

/// Validate a requested result count against `1..=max`.
pub fn validate_top_n(top_n: usize, max: usize) -> Result<usize, VideoError> {
    if (1..=max).contains(&top_n) {
        Ok(top_n)
    } else {
        Err(VideoError::InvalidParameter(format!(
            "top_n must be within 1..={max} (got {top_n})"
        )))
    }
}
