// src/llm/mod.rs
//! LLM provider abstraction + registry.
//!
//! Providers are selected per request by name. With `AI_TEST_MODE=mock` every
//! name resolves to a deterministic [`MockProvider`] so tests and local runs
//! never leave the process.

pub mod claude;
pub mod gemini;
pub mod openai;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::config::app::LlmConfig;
use crate::error::LlmError;

pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

pub const AI_TEST_MODE_ENV: &str = "AI_TEST_MODE";

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub text: String,
    pub model: String,
    pub tokens_used: Option<u32>,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, req: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Registry key, e.g. `"gemini"`.
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    fn is_configured(&self) -> bool {
        true
    }
}

pub type DynLlm = Arc<dyn LlmProvider>;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("llm_requests_total", "LLM completion requests by provider.");
        describe_counter!("llm_errors_total", "Failed LLM completions by provider.");
        describe_histogram!("llm_request_ms", "LLM round-trip in milliseconds.");
    });
}

/// Run one completion with telemetry. Blank completions are errors.
pub async fn complete(provider: &dyn LlmProvider, req: &LlmRequest) -> Result<LlmResponse, LlmError> {
    ensure_metrics_described();
    let name = provider.name();
    counter!("llm_requests_total", "provider" => name).increment(1);
    let t0 = Instant::now();

    let out = provider.generate(req).await.and_then(|r| {
        if r.text.trim().is_empty() {
            Err(LlmError::EmptyCompletion { provider: name })
        } else {
            Ok(r)
        }
    });
    histogram!("llm_request_ms", "provider" => name).record(t0.elapsed().as_secs_f64() * 1_000.0);

    match &out {
        Ok(r) => tracing::debug!(
            target: "llm",
            provider = name,
            model = %r.model,
            prompt_chars = req.prompt.chars().count(),
            tokens = ?r.tokens_used,
            "completion ok"
        ),
        Err(e) => {
            counter!("llm_errors_total", "provider" => name).increment(1);
            tracing::warn!(target: "llm", provider = name, error = %e, "completion failed");
        }
    }
    out
}

/// Shared client builder for the HTTP providers.
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("content-planner/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Map a non-success response to `LlmError::Upstream`, preferring the
/// provider's `{"error":{"message":...}}` text.
pub(crate) async fn upstream_error(provider: &'static str, resp: reqwest::Response) -> LlmError {
    #[derive(Deserialize)]
    struct Envelope {
        error: Inner,
    }
    #[derive(Deserialize)]
    struct Inner {
        message: String,
    }

    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Envelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    LlmError::Upstream {
        provider,
        status,
        message,
    }
}

/// Deterministic provider for tests and offline runs.
pub struct MockProvider {
    name: &'static str,
    replies: Vec<String>,
    fail: bool,
    calls: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    /// Echo-style replies derived from the prompt.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            replies: Vec::new(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replies returned in order; the last one repeats.
    pub fn with_replies<I, S>(name: &'static str, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            ..Self::new(name)
        }
    }

    /// Every call fails with an upstream error.
    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn calls(&self) -> Vec<LlmRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn generate(&self, req: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let n = {
            let mut calls = self.calls.lock();
            calls.push(req.clone());
            calls.len()
        };
        if self.fail {
            return Err(LlmError::Upstream {
                provider: self.name,
                status: 503,
                message: "mock failure".into(),
            });
        }
        let text = match self.replies.len() {
            0 => {
                let head: String = req
                    .prompt
                    .lines()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or_default()
                    .chars()
                    .take(60)
                    .collect();
                format!("[mock #{n}] {head}")
            }
            len => self.replies[(n - 1).min(len - 1)].clone(),
        };
        Ok(LlmResponse {
            tokens_used: Some(text.split_whitespace().count() as u32),
            text,
            model: format!("mock-{}", self.name),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn model(&self) -> &str {
        "mock"
    }
}

/// Name → provider lookup with a default.
pub struct LlmRegistry {
    default: String,
    providers: BTreeMap<&'static str, DynLlm>,
}

impl LlmRegistry {
    pub fn new(default: impl Into<String>, providers: Vec<DynLlm>) -> Self {
        Self {
            default: default.into(),
            providers: providers.into_iter().map(|p| (p.name(), p)).collect(),
        }
    }

    /// Real providers from config, or mocks under `AI_TEST_MODE=mock`.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self, LlmError> {
        let mock_mode = std::env::var(AI_TEST_MODE_ENV)
            .map(|v| v == "mock")
            .unwrap_or(false);
        if mock_mode {
            tracing::info!(target: "llm", "AI_TEST_MODE=mock, using mock providers");
            return Ok(Self::mock(&cfg.default_provider));
        }

        let providers: Vec<DynLlm> = vec![
            Arc::new(GeminiProvider::new(&cfg.gemini, cfg.timeout_secs)?),
            Arc::new(ClaudeProvider::new(&cfg.claude, cfg.timeout_secs)?),
            Arc::new(OpenAiProvider::new(&cfg.openai, cfg.timeout_secs)?),
        ];
        let reg = Self::new(cfg.default_provider.clone(), providers);
        tracing::info!(target: "llm", configured = ?reg.configured(), default = %reg.default, "llm providers ready");
        Ok(reg)
    }

    /// All known provider names backed by mocks.
    pub fn mock(default: &str) -> Self {
        let providers: Vec<DynLlm> = ["gemini", "claude", "openai", "mock"]
            .into_iter()
            .map(|n| Arc::new(MockProvider::new(n)) as DynLlm)
            .collect();
        Self::new(default, providers)
    }

    /// `None` or a blank name means the default provider.
    pub fn resolve(&self, name: Option<&str>) -> Result<DynLlm, LlmError> {
        let wanted = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| self.default.clone());
        self.providers
            .get(wanted.as_str())
            .cloned()
            .ok_or(LlmError::UnknownProvider(wanted))
    }

    /// Names of providers that have credentials.
    pub fn configured(&self) -> Vec<&'static str> {
        self.providers
            .values()
            .filter(|p| p.is_configured())
            .map(|p| p.name())
            .collect()
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }
}
