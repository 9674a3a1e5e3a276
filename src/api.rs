// src/api.rs
//! HTTP surface. Handlers stay thin: parse the wire shape, call the service
//! module, wrap the result. Every failure leaves as `{ "detail": ... }`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::error::{ApiError, VideoError};
use crate::ingest::types::VideoSource;
use crate::llm::{LlmProvider as _, LlmRegistry};
use crate::ranking::{self, RankingRequest};
use crate::repurpose::{self, channels, style::StyleConfig, TransformRequest};
use crate::scrape::BlogScraper;
use crate::script::{self, RewriteRequest};
use crate::session::{CurrentContent, SavedContent, SessionStore};
use crate::transcript::{self, TranscriptSource, DEFAULT_LANGUAGE};
use crate::video::{
    validate_top_n, DurationBucket, FilterSpec, ScoredVideo, ShortsMode, UploadPeriod, WeightSpec,
    MAX_SEARCH_TOP_N, MAX_TRENDING_TOP_N,
};

type ApiResult<T> = Result<T, ApiError>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub videos: Arc<dyn VideoSource>,
    pub transcripts: Arc<dyn TranscriptSource>,
    pub llm: Arc<LlmRegistry>,
    pub scraper: Arc<BlogScraper>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        videos: Arc<dyn VideoSource>,
        transcripts: Arc<dyn TranscriptSource>,
        llm: LlmRegistry,
    ) -> anyhow::Result<Self> {
        let scraper = BlogScraper::new(&config.scrape)?;
        Ok(Self {
            config: Arc::new(config),
            videos,
            transcripts,
            llm: Arc::new(llm),
            scraper: Arc::new(scraper),
            sessions: Arc::new(SessionStore::default()),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/youtube/search", get(search_get).post(search_post))
        .route("/youtube/trending", get(trending))
        .route("/youtube/transcript/{video_id}", get(transcript_text))
        .route("/youtube/transcript/{video_id}/languages", get(transcript_languages))
        .route("/youtube/rewrite", post(rewrite_script))
        .route("/youtube/analyze-script", post(analyze_script))
        .route("/scrape", post(scrape))
        .route("/analyze-style", post(analyze_style))
        .route("/channels", get(list_channels))
        .route("/prompts/{channel}", get(channel_prompt))
        .route("/transform", post(transform))
        .route(
            "/sessions/{id}/current",
            get(current_get).put(current_put).delete(current_delete),
        )
        .route(
            "/sessions/{id}/saved",
            get(saved_list).post(saved_add).delete(saved_clear),
        )
        .route("/sessions/{id}/saved/{item_id}", delete(saved_remove))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `{ "success": true, ...body }`
#[derive(Serialize)]
struct Success<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

fn ok<T: Serialize>(body: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        body,
    })
}

// ---- health ----

#[derive(Serialize)]
struct HealthResp {
    status: &'static str,
    youtube_enabled: bool,
    llm_providers: Vec<&'static str>,
    default_llm: String,
    version: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResp> {
    Json(HealthResp {
        status: "healthy",
        youtube_enabled: state.videos.is_configured(),
        llm_providers: state.llm.configured(),
        default_llm: state.llm.default_name().to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ---- video ranking ----

/// Wire parameters shared by search (query or JSON body) and trending.
/// Absent fields fall back to the endpoint's defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VideoParams {
    pub keyword: Option<String>,
    pub top_n: Option<usize>,
    pub shorts_only: Option<bool>,
    pub exclude_shorts: Option<bool>,
    pub duration_filter: Option<String>,
    pub upload_period: Option<String>,
    pub language: Option<String>,
    pub trending_mode: Option<bool>,
    pub min_views: Option<u64>,
    pub views_weight: Option<u32>,
    pub engagement_weight: Option<u32>,
    pub recency_weight: Option<u32>,
}

impl VideoParams {
    /// Overlay the wire values on `base`; every enum and bound is checked here.
    pub fn to_request(
        &self,
        base: RankingRequest,
        max_top_n: usize,
    ) -> Result<RankingRequest, VideoError> {
        let mut filter = base.filter;
        if self.shorts_only.is_some() || self.exclude_shorts.is_some() {
            filter.shorts = ShortsMode::from_flags(
                self.shorts_only.unwrap_or(false),
                self.exclude_shorts.unwrap_or(false),
            )?;
        }
        if let Some(d) = &self.duration_filter {
            filter.duration = d.parse()?;
        }
        if let Some(p) = &self.upload_period {
            filter.upload_period = p.parse()?;
        }
        if let Some(l) = &self.language {
            filter.language = l.parse()?;
        }
        if let Some(t) = self.trending_mode {
            filter.trending_mode = t;
        }
        if let Some(m) = self.min_views {
            filter.min_views = m;
        }

        let weights = match (self.views_weight, self.engagement_weight, self.recency_weight) {
            (None, None, None) => base.weights,
            (v, e, r) => WeightSpec::new(
                v.unwrap_or(u32::from(base.weights.views)),
                e.unwrap_or(u32::from(base.weights.engagement)),
                r.unwrap_or(u32::from(base.weights.recency)),
            )?,
        };

        Ok(RankingRequest {
            filter,
            weights,
            top_n: validate_top_n(self.top_n.unwrap_or(base.top_n), max_top_n)?,
        })
    }
}

/// The filters a listing was ranked with, after defaults and validation.
#[derive(Debug, Serialize)]
struct AppliedFilters {
    shorts_only: bool,
    exclude_shorts: bool,
    duration_filter: DurationBucket,
    upload_period: UploadPeriod,
    language: String,
    trending_mode: bool,
    min_views: u64,
}

impl From<&FilterSpec> for AppliedFilters {
    fn from(f: &FilterSpec) -> Self {
        Self {
            shorts_only: f.shorts == ShortsMode::ShortsOnly,
            exclude_shorts: f.shorts == ShortsMode::ExcludeShorts,
            duration_filter: f.duration,
            upload_period: f.upload_period,
            language: f.language.to_string(),
            trending_mode: f.trending_mode,
            min_views: f.min_views,
        }
    }
}

#[derive(Serialize)]
struct VideoListResp {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    keyword: String,
    count: usize,
    filters: AppliedFilters,
    videos: Vec<ScoredVideo>,
}

async fn run_search(state: &AppState, params: VideoParams) -> ApiResult<Json<Success<VideoListResp>>> {
    let keyword = params.keyword.as_deref().unwrap_or_default().trim().to_string();
    // No keyword: rank the trending surface with the caller's filters and its cap.
    let max_top_n = if keyword.is_empty() {
        MAX_TRENDING_TOP_N
    } else {
        MAX_SEARCH_TOP_N
    };
    let req = params.to_request(RankingRequest::default(), max_top_n)?;
    let (kind, videos) = if keyword.is_empty() {
        let videos = ranking::rank_trending(state.videos.as_ref(), &req, Utc::now()).await?;
        (Some("trending"), videos)
    } else {
        let videos = ranking::rank_search(state.videos.as_ref(), &keyword, &req, Utc::now()).await?;
        (None, videos)
    };
    Ok(ok(VideoListResp {
        kind,
        keyword,
        count: videos.len(),
        filters: AppliedFilters::from(&req.filter),
        videos,
    }))
}

async fn search_get(
    State(state): State<AppState>,
    params: Result<Query<VideoParams>, QueryRejection>,
) -> ApiResult<Json<Success<VideoListResp>>> {
    let Query(params) = params?;
    run_search(&state, params).await
}

async fn search_post(
    State(state): State<AppState>,
    body: Result<Json<VideoParams>, JsonRejection>,
) -> ApiResult<Json<Success<VideoListResp>>> {
    let Json(params) = body?;
    run_search(&state, params).await
}

async fn trending(
    State(state): State<AppState>,
    params: Result<Query<VideoParams>, QueryRejection>,
) -> ApiResult<Json<Success<VideoListResp>>> {
    let Query(params) = params?;
    let defaults = &state.config.trending;
    let base = RankingRequest {
        filter: defaults.filter()?,
        weights: defaults.weights()?,
        top_n: defaults.top_n.min(MAX_TRENDING_TOP_N),
    };
    let req = params.to_request(base, MAX_TRENDING_TOP_N)?;
    let videos = ranking::rank_trending(state.videos.as_ref(), &req, Utc::now()).await?;
    Ok(ok(VideoListResp {
        kind: Some("trending"),
        keyword: String::new(),
        count: videos.len(),
        filters: AppliedFilters::from(&req.filter),
        videos,
    }))
}

// ---- transcripts ----

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TranscriptQuery {
    lang: Option<String>,
    timestamps: bool,
}

async fn transcript_text(
    State(state): State<AppState>,
    video_id: Result<Path<String>, PathRejection>,
    query: Result<Query<TranscriptQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(video_id) = video_id?;
    let Query(q) = query?;
    let lang = q.lang.as_deref().unwrap_or(DEFAULT_LANGUAGE);
    let t = transcript::fetch_transcript(state.transcripts.as_ref(), &video_id, lang, q.timestamps)
        .await?;
    Ok(ok(t))
}

async fn transcript_languages(
    State(state): State<AppState>,
    video_id: Result<Path<String>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(video_id) = video_id?;
    let langs = transcript::available_languages(state.transcripts.as_ref(), &video_id).await?;
    Ok(ok(langs))
}

// ---- scripts ----

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScriptBody {
    original_script: String,
    style: String,
    target_length: String,
    additional_instructions: String,
    provider: Option<String>,
}

async fn rewrite_script(
    State(state): State<AppState>,
    body: Result<Json<ScriptBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    let req = RewriteRequest {
        style: body.style.parse()?,
        target_length: body.target_length.parse()?,
        original_script: body.original_script,
        additional_instructions: body.additional_instructions,
    };
    let provider = state.llm.resolve(body.provider.as_deref())?;
    let out = script::rewrite(provider.as_ref(), &req).await?;
    Ok(ok(out))
}

async fn analyze_script(
    State(state): State<AppState>,
    body: Result<Json<ScriptBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    let provider = state.llm.resolve(body.provider.as_deref())?;
    let out = script::analyze(provider.as_ref(), &body.original_script).await?;
    Ok(ok(out))
}

// ---- scraping & repurposing ----

#[derive(Debug, Deserialize)]
struct UrlBody {
    url: String,
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Serialize)]
struct ScrapeResp {
    title: String,
    content: String,
    source: &'static str,
    char_count: usize,
}

async fn scrape(
    State(state): State<AppState>,
    body: Result<Json<UrlBody>, JsonRejection>,
) -> ApiResult<Json<ScrapeResp>> {
    let Json(body) = body?;
    let page = state.scraper.scrape(&body.url).await?;
    Ok(Json(ScrapeResp {
        char_count: page.char_count(),
        source: page.source.as_str(),
        title: page.title,
        content: page.content,
    }))
}

#[derive(Serialize)]
struct StyleResp {
    title: String,
    #[serde(flatten)]
    analysis: repurpose::StyleAnalysis,
}

async fn analyze_style(
    State(state): State<AppState>,
    body: Result<Json<UrlBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    // Resolve first so a bad provider name fails before the page fetch.
    let provider = state.llm.resolve(body.provider.as_deref())?;
    let page = state.scraper.scrape(&body.url).await?;
    let analysis = repurpose::analyze_style(provider.as_ref(), &page.content).await?;
    Ok(ok(StyleResp {
        title: page.title,
        analysis,
    }))
}

async fn list_channels() -> Json<&'static [channels::Channel]> {
    Json(channels::CHANNELS.as_slice())
}

#[derive(Serialize)]
struct PromptResp {
    channel: &'static str,
    name: &'static str,
    prompt: &'static str,
}

async fn channel_prompt(key: Result<Path<String>, PathRejection>) -> ApiResult<Json<PromptResp>> {
    let Path(key) = key?;
    let ch = channels::find(&key)
        .ok_or_else(|| ApiError::NotFound(format!("unknown channel '{key}'")))?;
    Ok(Json(PromptResp {
        channel: ch.key,
        name: ch.name,
        prompt: ch.prompt,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StyleBody {
    tone: String,
    target: String,
    emoji_level: u8,
    custom: String,
}

impl Default for StyleBody {
    fn default() -> Self {
        let d = StyleConfig::default();
        Self {
            tone: String::new(),
            target: d.target,
            emoji_level: d.emoji_level,
            custom: d.custom,
        }
    }
}

fn default_channels() -> Vec<String> {
    channels::DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect()
}

#[derive(Debug, Deserialize)]
struct TransformBody {
    content: String,
    #[serde(default = "default_channels")]
    channels: Vec<String>,
    #[serde(default)]
    style_config: Option<StyleBody>,
    #[serde(default)]
    custom_prompts: HashMap<String, String>,
    #[serde(default)]
    provider: Option<String>,
}

async fn transform(
    State(state): State<AppState>,
    body: Result<Json<TransformBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    let style = body
        .style_config
        .map(|s| StyleConfig::new(&s.tone, &s.target, s.emoji_level, &s.custom))
        .transpose()?;
    let req = TransformRequest {
        content: body.content,
        channels: body.channels,
        style,
        custom_prompts: body
            .custom_prompts
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect(),
    };
    let provider = state.llm.resolve(body.provider.as_deref())?;
    let out = repurpose::transform(provider.as_ref(), &req).await?;
    tracing::info!(
        target: "api",
        provider = provider.name(),
        channels = out.results.len(),
        "transform finished"
    );
    Ok(ok(out))
}

// ---- sessions ----

fn session_id(p: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    let Path(id) = p?;
    SessionStore::validate_id(&id)?;
    Ok(id)
}

fn session_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("session '{id}' not found"))
}

async fn current_get(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<CurrentContent>> {
    let id = session_id(id)?;
    Ok(Json(state.sessions.snapshot(&id).current))
}

#[derive(Debug, Deserialize)]
struct CurrentBody {
    content: String,
    #[serde(default)]
    channel: Option<String>,
}

async fn current_put(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<CurrentBody>, JsonRejection>,
) -> ApiResult<Json<CurrentContent>> {
    let id = session_id(id)?;
    let Json(body) = body?;
    if body.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".into()));
    }
    let current = state.sessions.with_session(&id, |s| {
        s.set_current(body.content, body.channel);
        s.current.clone()
    });
    Ok(Json(current))
}

async fn current_delete(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = session_id(id)?;
    state
        .sessions
        .update_existing(&id, |s| s.clear_current())
        .ok_or_else(|| session_not_found(&id))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct SavedListResp {
    count: usize,
    saved_contents: Vec<SavedContent>,
}

async fn saved_list(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<SavedListResp>> {
    let id = session_id(id)?;
    let saved = state.sessions.snapshot(&id).saved_contents;
    Ok(Json(SavedListResp {
        count: saved.len(),
        saved_contents: saved,
    }))
}

#[derive(Debug, Deserialize)]
struct SavedBody {
    #[serde(default)]
    id: Option<String>,
    channel: String,
    #[serde(default)]
    channel_name: Option<String>,
    content: String,
}

async fn saved_add(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<SavedBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SavedContent>)> {
    let id = session_id(id)?;
    let Json(body) = body?;
    if body.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".into()));
    }
    let now = Utc::now();
    let channel_name = body
        .channel_name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| channels::find(&body.channel).map(|c| c.name.to_string()))
        .unwrap_or_else(|| body.channel.clone());
    let item = SavedContent {
        id: body
            .id
            .filter(|i| !i.trim().is_empty())
            .unwrap_or_else(|| state.sessions.next_item_id(now)),
        channel: body.channel,
        channel_name,
        content: body.content,
        created_at: now,
    };
    state.sessions.with_session(&id, |s| s.add_saved(item.clone()));
    Ok((StatusCode::CREATED, Json(item)))
}

async fn saved_clear(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = session_id(id)?;
    state
        .sessions
        .update_existing(&id, |s| s.clear_saved())
        .ok_or_else(|| session_not_found(&id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn saved_remove(
    State(state): State<AppState>,
    ids: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path((id, item_id)) = ids?;
    SessionStore::validate_id(&id)?;
    let removed = state
        .sessions
        .update_existing(&id, |s| s.remove_saved(&item_id))
        .ok_or_else(|| session_not_found(&id))?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("saved content '{item_id}' not found")))
    }
}
