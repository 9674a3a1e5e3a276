// src/lib.rs
// Public library surface for integration tests (and the binary).

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod metrics;
pub mod ranking;
pub mod repurpose;
pub mod scrape;
pub mod script;
pub mod session;
pub mod transcript;
pub mod video;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::ApiError;
