// src/llm/claude.rs
//! Anthropic Messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::app::ProviderConfig;
use crate::error::LlmError;
use crate::llm::{http_client, upstream_error, LlmProvider, LlmRequest, LlmResponse};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl ClaudeProvider {
    pub fn new(cfg: &ProviderConfig, timeout_secs: u64) -> Result<Self, LlmError> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [Msg<'a>; 1],
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    content: Vec<Block>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    output_tokens: Option<u32>,
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn generate(&self, req: &LlmRequest) -> Result<LlmResponse, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::NotConfigured("CLAUDE_API_KEY"));
        }
        let body = Req {
            model: &self.model,
            max_tokens: req.max_tokens,
            temperature: req.temperature.min(1.0),
            system: req.system.as_deref(),
            messages: [Msg {
                role: "user",
                content: &req.prompt,
            }],
        };

        let resp = self
            .http
            .post(format!("{}/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(upstream_error(self.name(), resp).await);
        }
        let parsed: Resp = resp.json().await?;
        let text = parsed
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");
        Ok(LlmResponse {
            text,
            model: self.model.clone(),
            tokens_used: parsed.usage.and_then(|u| u.output_tokens),
        })
    }

    fn name(&self) -> &'static str {
        "claude"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
