// src/ingest/types.rs
use chrono::{DateTime, Utc};

use crate::error::VideoError;
use crate::video::{FilterSpec, VideoCandidate};

/// Upstream video platform. The filter is passed along so a source can narrow
/// server-side; the filter stage still runs on whatever comes back.
#[async_trait::async_trait]
pub trait VideoSource: Send + Sync {
    /// Candidates for a keyword.
    async fn search(
        &self,
        keyword: &str,
        filter: &FilterSpec,
        now: DateTime<Utc>,
    ) -> Result<Vec<VideoCandidate>, VideoError>;

    /// Candidates from the platform's trending surface.
    async fn trending(&self, filter: &FilterSpec) -> Result<Vec<VideoCandidate>, VideoError>;

    fn name(&self) -> &'static str;

    /// Whether the source can serve requests (e.g. has credentials).
    fn is_configured(&self) -> bool {
        true
    }
}
