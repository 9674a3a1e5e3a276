// src/repurpose/style_analyzer.rs
//! Derive a reusable writing-style prompt from an existing post.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::{complete, LlmProvider, LlmRequest};

/// Only this much of the post is sent for analysis.
pub const ANALYSIS_MAX_CHARS: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleAnalysis {
    pub tone: String,
    pub vocabulary: String,
    pub sentence_style: String,
    pub structure: String,
    pub generated_prompt: String,
}

fn analysis_prompt(content: &str) -> String {
    let excerpt: String = content.chars().take(ANALYSIS_MAX_CHARS).collect();
    format!(
        r#"You are a professional content analyst. Analyze the blog post below in depth and extract its writing style.

Post:
---
{excerpt}
---

Focus on:

## 1. structure (most important)
- Overall flow (intro-body-conclusion, storytelling, listing)
- Heading patterns and paragraph breaks
- How the intro pulls the reader in and how the post closes (CTA)
- Use of examples, quotes and lists

## 2. vocabulary (very important)
- Characteristic words and expressions
- Jargon versus everyday words
- Interjections, emoji habits, forms of address
- Signature phrases

## 3. tone
- Overall mood (friendly, expert, humorous, ...)

## 4. sentence_style
- Sentence length and rhythm, questions, emphasis

Then write a detailed prompt that lets an AI reproduce this style exactly: putting a subject in place of {{topic}} must yield a post in the same style. Be specific about structure and vocabulary.

Reply with this JSON only, no other text:
{{
  "tone": "3-5 sentences",
  "vocabulary": "3-5 sentences with 2-3 representative examples",
  "sentence_style": "3-5 sentences",
  "structure": "3-5 sentences",
  "generated_prompt": "a long, detailed prompt of at least 500 characters"
}}"#
    )
}

/// Strip a ```json (or bare ```) fence if present.
pub fn extract_json(text: &str) -> &str {
    static FENCED: OnceCell<Regex> = OnceCell::new();
    let re = FENCED.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());
    let trimmed = text.trim();
    re.captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

pub fn parse_analysis(text: &str) -> Result<StyleAnalysis, LlmError> {
    serde_json::from_str(extract_json(text))
        .map_err(|e| LlmError::MalformedOutput(format!("style analysis: {e}")))
}

pub async fn analyze_style(
    provider: &dyn LlmProvider,
    content: &str,
) -> Result<StyleAnalysis, LlmError> {
    let resp = complete(provider, &LlmRequest::new(analysis_prompt(content))).await?;
    parse_analysis(&resp.text)
}
