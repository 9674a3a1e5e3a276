// src/llm/openai.rs
//! OpenAI Chat Completions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::app::ProviderConfig;
use crate::error::LlmError;
use crate::llm::{http_client, upstream_error, LlmProvider, LlmRequest, LlmResponse};

pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl OpenAiProvider {
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
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, req: &LlmRequest) -> Result<LlmResponse, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::NotConfigured("OPENAI_API_KEY"));
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = req.system.as_deref() {
            messages.push(Msg {
                role: "system",
                content: sys,
            });
        }
        messages.push(Msg {
            role: "user",
            content: &req.prompt,
        });
        let body = Req {
            model: &self.model,
            messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(upstream_error(self.name(), resp).await);
        }
        let parsed: Resp = resp.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(LlmResponse {
            text,
            model: self.model.clone(),
            tokens_used: parsed.usage.and_then(|u| u.total_tokens),
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
