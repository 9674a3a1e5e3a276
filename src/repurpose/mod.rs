// src/repurpose/mod.rs
//! Multi-channel content repurposing: one LLM call per channel, then one call
//! for the weekly publishing calendar.

pub mod channels;
pub mod style;
pub mod style_analyzer;

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ApiError;
use crate::llm::{complete, LlmProvider, LlmRequest};
use channels::{Channel, CALENDAR_PROMPT};
use style::{render_prompt, StyleConfig};

pub use style_analyzer::{analyze_style, StyleAnalysis};

#[derive(Debug, Clone, Default)]
pub struct TransformRequest {
    pub content: String,
    pub channels: Vec<String>,
    pub style: Option<StyleConfig>,
    /// Channel key → template replacing the built-in prompt.
    pub custom_prompts: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransformResult {
    pub channel: String,
    pub channel_name: String,
    pub content: String,
    pub char_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransformOutcome {
    pub results: Vec<TransformResult>,
    pub calendar: String,
}

/// Resolve and validate every channel before any LLM call is made.
pub fn resolve_channels(keys: &[String]) -> Result<Vec<&'static Channel>, ApiError> {
    if keys.is_empty() {
        return Err(ApiError::BadRequest("channels must not be empty".into()));
    }
    keys.iter()
        .map(|k| {
            channels::find(k).ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "unsupported channel '{k}'; available: {}",
                    channels::keys().collect::<Vec<_>>().join(", ")
                ))
            })
        })
        .collect()
}

pub fn calendar_prompt(results: &[TransformResult]) -> String {
    let contents = results
        .iter()
        .map(|r| format!("[{}]\n{}", r.channel_name, r.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    CALENDAR_PROMPT.replace("{transformed_contents}", &contents)
}

/// Transform `content` for every requested channel, then plan the week.
/// Any failed call aborts the whole request.
pub async fn transform(
    provider: &dyn LlmProvider,
    req: &TransformRequest,
) -> Result<TransformOutcome, ApiError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".into()));
    }
    let targets = resolve_channels(&req.channels)?;

    let mut results = Vec::with_capacity(targets.len());
    for ch in targets {
        let template = req
            .custom_prompts
            .get(ch.key)
            .map(String::as_str)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(ch.prompt);
        let prompt = render_prompt(template, req.style.as_ref(), content);
        let resp = complete(provider, &LlmRequest::new(prompt)).await?;
        tracing::debug!(target: "repurpose", channel = ch.key, chars = resp.text.chars().count(), "channel transformed");
        results.push(TransformResult {
            channel: ch.key.to_string(),
            channel_name: ch.name.to_string(),
            char_count: resp.text.chars().count(),
            content: resp.text,
        });
    }

    let calendar = complete(provider, &LlmRequest::new(calendar_prompt(&results)))
        .await?
        .text;
    Ok(TransformOutcome { results, calendar })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockProvider;

    fn req(channels: &[&str]) -> TransformRequest {
        TransformRequest {
            content: "Rust 1.80 ships LazyLock.".into(),
            channels: channels.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn one_call_per_channel_plus_calendar() {
        let mock = MockProvider::with_replies("mock", ["blog text", "tweet text", "[calendar]"]);
        let out = transform(&mock, &req(&["blog", "twitter"])).await.unwrap();
        assert_eq!(out.results.len(), 2);
        assert_eq!(out.results[0].channel, "blog");
        assert_eq!(out.results[1].channel_name, "X (Twitter)");
        assert_eq!(out.results[1].char_count, "tweet text".len());
        assert_eq!(out.calendar, "[calendar]");

        let calls = mock.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].prompt.contains("Rust 1.80 ships LazyLock."));
        assert!(calls[2].prompt.contains("[Blog]\nblog text"));
    }

    #[tokio::test]
    async fn unknown_channel_fails_before_any_call() {
        let mock = MockProvider::new("mock");
        let err = transform(&mock, &req(&["blog", "tiktok"])).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m.contains("tiktok")));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_aborts() {
        let mock = MockProvider::failing("mock");
        let err = transform(&mock, &req(&["blog"])).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn custom_prompt_overrides_template() {
        let mock = MockProvider::new("mock");
        let mut r = req(&["threads"]);
        r.custom_prompts
            .insert("threads".into(), "Summarize in one line.\nSource content:\n{content}".into());
        transform(&mock, &r).await.unwrap();
        let first = &mock.calls()[0].prompt;
        assert!(first.starts_with("Summarize in one line."));
        assert!(!first.contains("Threads marketing expert"));
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let mock = MockProvider::new("mock");
        let mut r = req(&["blog"]);
        r.content = "  ".into();
        assert!(matches!(
            transform(&mock, &r).await,
            Err(ApiError::BadRequest(_))
        ));
    }
}
