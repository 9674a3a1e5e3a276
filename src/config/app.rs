// src/config/app.rs
//! Service configuration from TOML.
//!
//! Lookup: `$APP_CONFIG_PATH`, then `config/app.toml`, then built-in defaults.
//! Any `api_key = "ENV"` (or an empty key) is read from the matching env var;
//! a key that is still empty leaves that upstream disabled rather than failing startup.

use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::VideoError;
use crate::ingest::providers::youtube::DEFAULT_API_BASE;
use crate::video::{
    validate_top_n, DurationBucket, FilterSpec, LanguageFilter, ShortsMode, UploadPeriod,
    WeightSpec, DEFAULT_TOP_N, MAX_TRENDING_TOP_N,
};

pub const ENV_CONFIG_PATH: &str = "APP_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

const ENV_MARKER: &str = "ENV";

fn resolve_key(raw: &str, env_var: &str) -> String {
    let t = raw.trim();
    if t.is_empty() || t.eq_ignore_ascii_case(ENV_MARKER) {
        env::var(env_var).unwrap_or_default().trim().to_string()
    } else {
        t.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub api_base: String,
    /// Candidates requested per upstream call (API maximum is 50).
    pub max_results: usize,
    pub default_region: String,
    pub default_relevance_language: String,
    pub timeout_secs: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: ENV_MARKER.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            max_results: 50,
            default_region: "KR".into(),
            default_relevance_language: "ko".into(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

impl ProviderConfig {
    fn with(model: &str, api_base: &str) -> Self {
        Self {
            api_key: ENV_MARKER.into(),
            model: model.into(),
            api_base: api_base.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Used when a request does not name a provider.
    pub default_provider: String,
    pub timeout_secs: u64,
    pub gemini: ProviderConfig,
    pub claude: ProviderConfig,
    pub openai: ProviderConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: "gemini".into(),
            timeout_secs: 60,
            gemini: ProviderConfig::with(
                "gemini-2.5-flash",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            claude: ProviderConfig::with("claude-3-5-sonnet-latest", "https://api.anthropic.com/v1"),
            openai: ProviderConfig::with("gpt-4o-mini", "https://api.openai.com/v1"),
        }
    }
}

/// Default filter/weight set for the trending feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrendingConfig {
    pub shorts: ShortsMode,
    pub duration: DurationBucket,
    pub upload_period: UploadPeriod,
    pub language: String,
    pub min_views: u64,
    pub trending_mode: bool,
    pub top_n: usize,
    pub views_weight: u32,
    pub engagement_weight: u32,
    pub recency_weight: u32,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            shorts: ShortsMode::ExcludeShorts,
            duration: DurationBucket::Any,
            upload_period: UploadPeriod::Any,
            language: "any".into(),
            min_views: 0,
            trending_mode: true,
            top_n: DEFAULT_TOP_N,
            views_weight: 30,
            engagement_weight: 40,
            recency_weight: 30,
        }
    }
}

impl TrendingConfig {
    pub fn filter(&self) -> Result<FilterSpec, VideoError> {
        Ok(FilterSpec {
            shorts: self.shorts,
            duration: self.duration,
            upload_period: self.upload_period,
            language: self.language.parse::<LanguageFilter>()?,
            min_views: self.min_views,
            trending_mode: self.trending_mode,
        })
    }

    pub fn weights(&self) -> Result<WeightSpec, VideoError> {
        WeightSpec::new(self.views_weight, self.engagement_weight, self.recency_weight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrapeConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Extracted content is cut to this many chars.
    pub max_chars: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into(),
            max_chars: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub youtube: YouTubeConfig,
    pub llm: LlmConfig,
    pub trending: TrendingConfig,
    pub scrape: ScrapeConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing app config")?;
        Ok(cfg.finish())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// `$APP_CONFIG_PATH` must exist when set; the default path is optional.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            return Self::load_from_file(&pb);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from_file(&default);
        }
        Ok(AppConfig::default().finish())
    }

    /// Resolve env keys and replace out-of-range values with defaults.
    fn finish(mut self) -> Self {
        self.youtube.api_key = resolve_key(&self.youtube.api_key, "YOUTUBE_API_KEY");
        self.llm.gemini.api_key = resolve_key(&self.llm.gemini.api_key, "GEMINI_API_KEY");
        self.llm.claude.api_key = resolve_key(&self.llm.claude.api_key, "CLAUDE_API_KEY");
        self.llm.openai.api_key = resolve_key(&self.llm.openai.api_key, "OPENAI_API_KEY");
        self.llm.default_provider = self.llm.default_provider.trim().to_lowercase();
        let llm = LlmConfig::default();
        for (p, d) in [
            (&mut self.llm.gemini, &llm.gemini),
            (&mut self.llm.claude, &llm.claude),
            (&mut self.llm.openai, &llm.openai),
        ] {
            if p.model.trim().is_empty() {
                p.model = d.model.clone();
            }
            if p.api_base.trim().is_empty() {
                p.api_base = d.api_base.clone();
            }
        }

        let yt = YouTubeConfig::default();
        if !(1..=50).contains(&self.youtube.max_results) {
            self.youtube.max_results = yt.max_results;
        }
        if self.youtube.timeout_secs == 0 {
            self.youtube.timeout_secs = yt.timeout_secs;
        }
        if self.llm.timeout_secs == 0 {
            self.llm.timeout_secs = llm.timeout_secs;
        }

        let sc = ScrapeConfig::default();
        if self.scrape.timeout_secs == 0 {
            self.scrape.timeout_secs = sc.timeout_secs;
        }
        if self.scrape.max_chars == 0 {
            self.scrape.max_chars = sc.max_chars;
        }

        if self.trending.filter().is_err()
            || self.trending.weights().is_err()
            || validate_top_n(self.trending.top_n, MAX_TRENDING_TOP_N).is_err()
        {
            tracing::warn!(target: "config", "invalid [trending] section, using defaults");
            self.trending = TrendingConfig::default();
        }
        self
    }
}
