// src/error.rs
//! Error types shared by the ranking pipeline, the companion services and the HTTP layer.
//!
//! Each area owns a `thiserror` enum. `ApiError` folds them into a status code plus the
//! `{ "detail": ... }` body the frontend shows verbatim.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures of the video ranking pipeline (validation + ingestion).
#[derive(Debug, Error)]
pub enum VideoError {
    /// Request parameter rejected before ingestion.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Upstream platform cannot be reached without credentials.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Upstream answered with a quota/rate-limit error.
    #[error("upstream quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Upstream answered with a non-success status.
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Network/transport failure.
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream payload could not be decoded.
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// Failures of transcript extraction.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("video is unavailable: {0}")]
    VideoUnavailable(String),

    #[error("subtitles are disabled for this video")]
    Disabled,

    #[error("no transcript found for languages {0:?}")]
    NoTranscript(Vec<String>),

    #[error("transcript request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed transcript data: {0}")]
    Malformed(String),
}

/// Failures talking to an LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("{provider} returned HTTP {status}: {message}")]
    Upstream {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned an empty completion")]
    EmptyCompletion { provider: &'static str },

    #[error("could not parse LLM output: {0}")]
    MalformedOutput(String),
}

/// Failures of blog scraping.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("page request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("page returned HTTP {0}")]
    Status(u16),

    #[error("could not extract content; check the page structure")]
    NoContent,
}

/// Error surfaced by HTTP handlers. Rendered as `{ "detail": "..." }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Video(#[from] VideoError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Video(e) => match e {
                VideoError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
                VideoError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
                VideoError::QuotaExceeded(_)
                | VideoError::Upstream { .. }
                | VideoError::Http(_)
                | VideoError::Malformed(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Transcript(e) => match e {
                TranscriptError::VideoUnavailable(_)
                | TranscriptError::Disabled
                | TranscriptError::NoTranscript(_) => StatusCode::NOT_FOUND,
                TranscriptError::Http(_) | TranscriptError::Malformed(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            ApiError::Llm(e) => match e {
                LlmError::UnknownProvider(_) => StatusCode::BAD_REQUEST,
                LlmError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
                LlmError::Upstream { .. }
                | LlmError::Http(_)
                | LlmError::EmptyCompletion { .. }
                | LlmError::MalformedOutput(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Scrape(e) => match e {
                ScrapeError::InvalidUrl(_) | ScrapeError::NoContent => StatusCode::BAD_REQUEST,
                ScrapeError::Http(_) | ScrapeError::Status(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

// Extractor rejections keep the `{detail}` contract instead of axum's plain-text body.
impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(r: PathRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(target: "api", %status, error = %self, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
