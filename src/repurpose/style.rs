// src/repurpose/style.rs
//! Writing style knobs for channel transforms.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::repurpose::channels::{CONTENT_PLACEHOLDER, SOURCE_MARKER};

pub const GENERAL_AUDIENCE: &str = "general audience";
pub const MAX_EMOJI_LEVEL: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Professional,
    #[default]
    Casual,
    Friendly,
    Humorous,
    Formal,
}

impl Tone {
    fn instruction(self) -> &'static str {
        match self {
            Tone::Professional => "Write in a professional, trustworthy tone.",
            Tone::Casual => "Write in a relaxed, casual tone.",
            Tone::Friendly => "Write in a warm, friendly tone.",
            Tone::Humorous => "Mix in humor and keep it fun.",
            Tone::Formal => "Write in a formal register.",
        }
    }
}

impl FromStr for Tone {
    type Err = ApiError;

    /// Accepts the English keys and the Korean labels the web client sends.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "professional" | "전문적" => Ok(Tone::Professional),
            "" | "casual" | "캐주얼" => Ok(Tone::Casual),
            "friendly" | "친근한" => Ok(Tone::Friendly),
            "humorous" | "유머러스" => Ok(Tone::Humorous),
            "formal" | "격식체" => Ok(Tone::Formal),
            other => Err(ApiError::BadRequest(format!(
                "tone must be one of professional, casual, friendly, humorous, formal (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleConfig {
    pub tone: Tone,
    pub target: String,
    pub emoji_level: u8,
    pub custom: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            tone: Tone::Casual,
            target: GENERAL_AUDIENCE.into(),
            emoji_level: 1,
            custom: String::new(),
        }
    }
}

impl StyleConfig {
    pub fn new(tone: &str, target: &str, emoji_level: u8, custom: &str) -> Result<Self, ApiError> {
        if emoji_level > MAX_EMOJI_LEVEL {
            return Err(ApiError::BadRequest(format!(
                "emoji_level must be within 0..={MAX_EMOJI_LEVEL} (got {emoji_level})"
            )));
        }
        Ok(Self {
            tone: tone.parse()?,
            target: target.trim().to_string(),
            emoji_level,
            custom: custom.trim().to_string(),
        })
    }

    fn is_general_audience(&self) -> bool {
        let t = self.target.as_str();
        t.is_empty() || t.eq_ignore_ascii_case(GENERAL_AUDIENCE) || t == "일반 대중"
    }

    /// Bulleted style guide for the prompt.
    pub fn instruction(&self) -> String {
        let mut lines = vec![self.tone.instruction().to_string()];
        if !self.is_general_audience() {
            lines.push(format!(
                "The target reader is '{}'. Use vocabulary and depth that suit them.",
                self.target
            ));
        }
        lines.push(
            match self.emoji_level {
                0 => "Do not use emoji.",
                1 => "Use emoji sparingly (2-3).",
                2 => "Use plenty of emoji (5-7).",
                _ => "Use emoji very actively (10 or more).",
            }
            .to_string(),
        );
        if !self.custom.is_empty() {
            lines.push(format!("Additional request: {}", self.custom));
        }

        let mut out = String::from("**Style guide:**");
        for l in lines {
            out.push_str("\n- ");
            out.push_str(&l);
        }
        out
    }
}

/// Fill a channel template. The style guide goes before the source marker;
/// templates missing the marker or placeholder get them appended.
pub fn render_prompt(template: &str, style: Option<&StyleConfig>, content: &str) -> String {
    let mut prompt = template.to_string();
    if !prompt.contains(CONTENT_PLACEHOLDER) {
        prompt.push_str(&format!("\n\n{SOURCE_MARKER}\n{CONTENT_PLACEHOLDER}"));
    }
    // Split at the template's own placeholder so neither the guide nor the
    // content can be mistaken for it.
    let (head, tail) = prompt
        .split_once(CONTENT_PLACEHOLDER)
        .unwrap_or((prompt.as_str(), ""));
    let head = match style {
        Some(style) => {
            let guide = style.instruction();
            if head.contains(SOURCE_MARKER) {
                head.replacen(SOURCE_MARKER, &format!("{guide}\n\n{SOURCE_MARKER}"), 1)
            } else {
                format!("{guide}\n\n{head}")
            }
        }
        None => head.to_string(),
    };
    format!("{head}{content}{tail}")
}
