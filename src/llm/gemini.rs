// src/llm/gemini.rs
//! Google Gemini `generateContent`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::app::ProviderConfig;
use crate::error::LlmError;
use crate::llm::{http_client, upstream_error, LlmProvider, LlmRequest, LlmResponse};

pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiProvider {
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
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Req<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(&self, req: &LlmRequest) -> Result<LlmResponse, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::NotConfigured("GEMINI_API_KEY"));
        }
        let body = Req {
            contents: [Content {
                role: "user",
                parts: [Part { text: &req.prompt }],
            }],
            system_instruction: req.system.as_deref().map(|s| SystemInstruction {
                parts: [Part { text: s }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: req.max_tokens,
                temperature: req.temperature,
            },
        };

        let resp = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                self.api_base, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(upstream_error(self.name(), resp).await);
        }
        let parsed: Resp = resp.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();
        Ok(LlmResponse {
            text,
            model: self.model.clone(),
            tokens_used: parsed.usage_metadata.and_then(|u| u.total_token_count),
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
