// src/repurpose/channels.rs
//! Channel catalog: one prompt template per publishing channel.
//!
//! Every template contains `{content}` once and a `Source content:` marker;
//! style instructions are spliced in right before the marker.

use serde::Serialize;

pub const CONTENT_PLACEHOLDER: &str = "{content}";
pub const SOURCE_MARKER: &str = "Source content:";

/// Channels used when a transform request does not list any.
pub const DEFAULT_CHANNELS: [&str; 3] = ["blog", "instagram", "threads"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub prompt: &'static str,
}

pub static CHANNELS: [Channel; 5] = [
    Channel {
        key: "blog",
        name: "Blog",
        description: "SEO-friendly informational blog post",
        prompt: "You are an SEO-savvy blog writer.
Turn the source content into a blog post.

Rules:
- Informative, professional tone
- Structure with subheadings (H2, H3)
- Work search keywords in naturally
- 300-500 words
- End with a call to action

Source content:
{content}

Blog post:",
    },
    Channel {
        key: "instagram",
        name: "Instagram",
        description: "Casual, emotional Instagram caption",
        prompt: "You are an Instagram marketing expert.
Turn the source content into an Instagram caption.

Rules:
- Casual, friendly tone
- Hook the reader in the first sentence
- Use emoji where they fit (3-5)
- 150-200 characters
- Add 5 relevant hashtags

Source content:
{content}

Instagram caption:",
    },
    Channel {
        key: "threads",
        name: "Threads",
        description: "Conversational Threads post",
        prompt: "You are a Threads marketing expert.
Turn the source content into a Threads post.

Rules:
- Natural, conversational tone
- Short, punchy sentences
- Invite replies with a question or a request for opinions
- 100-150 characters
- Keep hashtags minimal (1-2)

Source content:
{content}

Threads post:",
    },
    Channel {
        key: "linkedin",
        name: "LinkedIn",
        description: "Professional-perspective LinkedIn post",
        prompt: "You are a LinkedIn content expert.
Turn the source content into a LinkedIn post.

Rules:
- Expert yet approachable tone
- Share it as an insight or lesson learned
- Use line breaks for readability
- 200-300 words
- Close with a question that starts a discussion

Source content:
{content}

LinkedIn post:",
    },
    Channel {
        key: "twitter",
        name: "X (Twitter)",
        description: "High-impact tweet",
        prompt: "You are an X (Twitter) marketing expert.
Turn the source content into a tweet.

Rules:
- Only the core message, with impact
- At most 280 characters
- A strong opening line
- 1-2 hashtags only

Source content:
{content}

Tweet:",
    },
];

pub const CALENDAR_PROMPT: &str = r#"You are a social media marketing expert.
Build a one-week publishing calendar for the content below.

Rules:
- Pick the best publishing time for each channel (local time)
- Assign only 1-2 channels per day
- Weekends go to casual channels (instagram, threads)
- Weekdays go to professional channels (blog, linkedin)

Transformed content:
{transformed_contents}

Output only the JSON below, with no other text:
[
  {"day": "monday", "channel": "channel key", "channelName": "channel name", "time": "HH:MM", "reason": "one-line reason"},
  {"day": "tuesday", "channel": "channel key", "channelName": "channel name", "time": "HH:MM", "reason": "one-line reason"},
  {"day": "wednesday", "channel": "channel key", "channelName": "channel name", "time": "HH:MM", "reason": "one-line reason"},
  {"day": "thursday", "channel": "channel key", "channelName": "channel name", "time": "HH:MM", "reason": "one-line reason"},
  {"day": "friday", "channel": "channel key", "channelName": "channel name", "time": "HH:MM", "reason": "one-line reason"},
  {"day": "saturday", "channel": "channel key", "channelName": "channel name", "time": "HH:MM", "reason": "one-line reason"},
  {"day": "sunday", "channel": "channel key", "channelName": "channel name", "time": "HH:MM", "reason": "one-line reason"}
]

Channel key is one of: blog, instagram, threads, linkedin, twitter.
Days without a transformed channel use "channel": null, "channelName": "Rest", "reason": "No post"."#;

pub fn find(key: &str) -> Option<&'static Channel> {
    let key = key.trim();
    CHANNELS.iter().find(|c| c.key.eq_ignore_ascii_case(key))
}

pub fn keys() -> impl Iterator<Item = &'static str> {
    CHANNELS.iter().map(|c| c.key)
}
