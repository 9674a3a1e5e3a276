// src/script.rs
//! Script rewriting and analysis on top of an [`LlmProvider`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ApiError;
use crate::llm::{complete, LlmProvider, LlmRequest};

pub const REWRITE_TEMPERATURE: f32 = 0.7;
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

const REWRITE_SYSTEM: &str = "You are a professional YouTube script writer.
Study the reference script and write a completely new script on the same topic with the same structure.

Principles:
1. Keep the core message and structure of the original.
2. Rewrite every sentence in fresh wording.
3. Use natural spoken language.
4. Open with a hook that earns the viewer's attention.
5. Use clear transitions and a clear conclusion.
Write in the same language as the reference script.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStyle {
    #[default]
    Informative,
    Entertaining,
    Educational,
    Conversational,
}

impl ScriptStyle {
    fn instruction(self) -> &'static str {
        match self {
            ScriptStyle::Informative => "Clear, objective, information-first delivery.",
            ScriptStyle::Entertaining => "Fun and engaging, with plenty of humor and examples.",
            ScriptStyle::Educational => "Step-by-step explanations that highlight the key concepts.",
            ScriptStyle::Conversational => "Friendly, as if talking directly to the viewer.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScriptStyle::Informative => "informative",
            ScriptStyle::Entertaining => "entertaining",
            ScriptStyle::Educational => "educational",
            ScriptStyle::Conversational => "conversational",
        }
    }
}

impl FromStr for ScriptStyle {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "informative" => Ok(ScriptStyle::Informative),
            "entertaining" => Ok(ScriptStyle::Entertaining),
            "educational" => Ok(ScriptStyle::Educational),
            "conversational" => Ok(ScriptStyle::Conversational),
            other => Err(ApiError::BadRequest(format!(
                "style must be one of informative, entertaining, educational, conversational (got '{other}')"
            ))),
        }
    }
}

impl fmt::Display for ScriptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLength {
    Shorter,
    #[default]
    Similar,
    Longer,
}

impl TargetLength {
    fn instruction(self) -> &'static str {
        match self {
            TargetLength::Shorter => "About 30% shorter than the original, summarized.",
            TargetLength::Similar => "About the same length as the original.",
            TargetLength::Longer => "About 30% longer than the original, with more detail.",
        }
    }
}

impl FromStr for TargetLength {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "similar" => Ok(TargetLength::Similar),
            "shorter" => Ok(TargetLength::Shorter),
            "longer" => Ok(TargetLength::Longer),
            other => Err(ApiError::BadRequest(format!(
                "target_length must be one of shorter, similar, longer (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewriteRequest {
    pub original_script: String,
    pub style: ScriptStyle,
    pub target_length: TargetLength,
    pub additional_instructions: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RewriteOutcome {
    pub rewritten_script: String,
    pub model_used: String,
    /// Lengths are in chars.
    pub original_length: usize,
    pub rewritten_length: usize,
    pub style: ScriptStyle,
    pub target_length: TargetLength,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScriptAnalysis {
    pub analysis: String,
    pub model_used: String,
}

fn require_script(script: &str) -> Result<&str, ApiError> {
    let s = script.trim();
    if s.is_empty() {
        Err(ApiError::BadRequest("script must not be empty".into()))
    } else {
        Ok(s)
    }
}

pub fn rewrite_prompt(req: &RewriteRequest) -> String {
    let mut instructions = format!(
        "- Style: {}\n- Length: {}\n",
        req.style.instruction(),
        req.target_length.instruction()
    );
    let extra = req.additional_instructions.trim();
    if !extra.is_empty() {
        instructions.push_str(&format!("- Additional request: {extra}\n"));
    }
    format!(
        "## Reference script:\n{}\n\n## Requirements:\n{instructions}\n## Task:\nAnalyze the reference script above and write a completely new YouTube script on the same topic.\nUse script format and a natural speaking tone.\n",
        req.original_script.trim()
    )
}

pub fn analysis_prompt(script: &str) -> String {
    format!(
        "Analyze the following script:\n\n{script}\n\nReturn the analysis as JSON with these fields:\n1. topic: the main topic\n2. structure: how the intro, body and conclusion are organized\n3. tone: the overall tone\n4. key_points: 3-5 main points\n5. estimated_duration: estimated reading time in minutes\n"
    )
}

pub async fn rewrite(
    provider: &dyn LlmProvider,
    req: &RewriteRequest,
) -> Result<RewriteOutcome, ApiError> {
    let original = require_script(&req.original_script)?;
    let llm_req = LlmRequest::new(rewrite_prompt(req))
        .system(REWRITE_SYSTEM)
        .temperature(REWRITE_TEMPERATURE);
    let resp = complete(provider, &llm_req).await?;
    Ok(RewriteOutcome {
        original_length: original.chars().count(),
        rewritten_length: resp.text.chars().count(),
        rewritten_script: resp.text,
        model_used: resp.model,
        style: req.style,
        target_length: req.target_length,
    })
}

pub async fn analyze(provider: &dyn LlmProvider, script: &str) -> Result<ScriptAnalysis, ApiError> {
    let script = require_script(script)?;
    let llm_req = LlmRequest::new(analysis_prompt(script)).temperature(ANALYSIS_TEMPERATURE);
    let resp = complete(provider, &llm_req).await?;
    Ok(ScriptAnalysis {
        analysis: resp.text,
        model_used: resp.model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockProvider;

    fn req(script: &str) -> RewriteRequest {
        RewriteRequest {
            original_script: script.into(),
            style: ScriptStyle::Educational,
            target_length: TargetLength::Longer,
            additional_instructions: "mention Rust".into(),
        }
    }

    #[test]
    fn enums_parse_and_reject() {
        assert_eq!("".parse::<ScriptStyle>().unwrap(), ScriptStyle::Informative);
        assert_eq!("Entertaining".parse::<ScriptStyle>().unwrap(), ScriptStyle::Entertaining);
        assert!("poetic".parse::<ScriptStyle>().is_err());
        assert_eq!("shorter".parse::<TargetLength>().unwrap(), TargetLength::Shorter);
        assert!("tiny".parse::<TargetLength>().is_err());
    }

    #[test]
    fn prompt_carries_instructions() {
        let p = rewrite_prompt(&req("hello world"));
        assert!(p.contains("hello world"));
        assert!(p.contains("Step-by-step"));
        assert!(p.contains("30% longer"));
        assert!(p.contains("Additional request: mention Rust"));
    }

    #[tokio::test]
    async fn rewrite_uses_creative_temperature_and_counts_chars() {
        let mock = MockProvider::with_replies("mock", ["새 대본"]);
        let out = rewrite(&mock, &req("원본 스크립트")).await.unwrap();
        assert_eq!(out.rewritten_script, "새 대본");
        assert_eq!(out.original_length, 6);
        assert_eq!(out.rewritten_length, 4);
        assert_eq!(out.model_used, "mock-mock");

        let calls = mock.calls();
        assert_eq!(calls[0].temperature, REWRITE_TEMPERATURE);
        assert!(calls[0].system.is_some());
    }

    #[tokio::test]
    async fn analyze_uses_low_temperature() {
        let mock = MockProvider::with_replies("mock", ["{\"topic\":\"x\"}"]);
        let out = analyze(&mock, "some script").await.unwrap();
        assert_eq!(out.analysis, "{\"topic\":\"x\"}");
        assert_eq!(mock.calls()[0].temperature, ANALYSIS_TEMPERATURE);
    }

    #[tokio::test]
    async fn empty_script_is_bad_request() {
        let mock = MockProvider::new("mock");
        let err = rewrite(&mock, &req("   ")).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(mock.calls().is_empty());
    }
}
