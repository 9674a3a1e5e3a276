// src/main.rs
//! Content planner: binary entrypoint.
//! Boots the Axum HTTP server with config, upstream clients and metrics.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use content_planner::{
    api::{self, AppState},
    config::AppConfig,
    ingest,
    llm::LlmRegistry,
    metrics::Metrics,
    transcript::{youtube::DEFAULT_WATCH_BASE, WatchPageTranscripts},
};

/// Compact logs by default, JSON lines with `LOG_FORMAT=json`.
/// `try_init` keeps a subscriber installed by the runtime.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("content_planner=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load()?;
    let videos = ingest::build_source(&config)?;
    let transcripts = Arc::new(
        WatchPageTranscripts::new(DEFAULT_WATCH_BASE).map_err(anyhow::Error::from)?,
    );
    let llm = LlmRegistry::from_config(&config.llm).map_err(anyhow::Error::from)?;

    let state = AppState::new(config, videos, transcripts, llm)?;
    let mut router = api::router(state);

    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "metrics disabled"),
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "content planner ready");
    Ok(router.into())
}
