// src/scrape.rs
//! Blog/article text extraction.
//!
//! Platform is picked from the host; each platform has an ordered list of body
//! selectors. Navigation chrome (script, style, nav, header, footer, aside,
//! iframe) never contributes text.

use std::fmt;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use crate::config::app::ScrapeConfig;
use crate::error::ScrapeError;

const EXCLUDED_TAGS: [&str; 7] = ["script", "style", "nav", "header", "footer", "aside", "iframe"];

/// A selector hit shorter than this falls through to the next selector / `body`.
const MIN_SELECTOR_CHARS: usize = 100;

/// Pages with less extractable text than this are rejected.
pub const MIN_CONTENT_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Naver,
    Tistory,
    Velog,
    Brunch,
    Medium,
    Default,
}

impl Platform {
    pub fn detect(url: &Url) -> Self {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if host.contains("blog.naver") {
            Platform::Naver
        } else if host.contains("tistory") {
            Platform::Tistory
        } else if host.contains("velog.io") {
            Platform::Velog
        } else if host.contains("brunch.co.kr") {
            Platform::Brunch
        } else if host.contains("medium.com") {
            Platform::Medium
        } else {
            Platform::Default
        }
    }

    fn selectors(self) -> &'static [&'static str] {
        match self {
            Platform::Naver => &[".se-main-container", ".post-view", "#postViewArea", ".sect_dsc"],
            Platform::Tistory => &[".entry-content", ".article-view", "#article-view", ".post-content"],
            Platform::Velog => &[".atom-one", "div[class*='sc-']"],
            Platform::Brunch => &[".wrap_body", ".article_view"],
            Platform::Medium => &["article", ".postArticle-content"],
            Platform::Default => &[
                "article",
                "main",
                ".post-content",
                ".entry-content",
                ".article-content",
                ".content",
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Naver => "naver",
            Platform::Tistory => "tistory",
            Platform::Velog => "velog",
            Platform::Brunch => "brunch",
            Platform::Medium => "medium",
            Platform::Default => "default",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScrapedContent {
    pub url: String,
    pub title: String,
    pub content: String,
    pub source: Platform,
}

impl ScrapedContent {
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

fn excluded(el: &ElementRef<'_>) -> bool {
    EXCLUDED_TAGS.contains(&el.value().name())
}

/// Stripped text pieces under `root`, skipping excluded subtrees.
fn text_pieces(root: ElementRef<'_>) -> Vec<String> {
    let mut out = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| excluded(&el));
        if hidden {
            continue;
        }
        let t = text.trim();
        if !t.is_empty() {
            out.push(t.to_string());
        }
    }
    out
}

fn first_visible<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(css).ok()?;
    doc.select(&sel).find(|el| {
        !excluded(el)
            && !el
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| excluded(&a))
    })
}

/// Title and body text for a page on `platform`.
pub fn extract_content(html: &str, platform: Platform) -> (String, String) {
    let doc = Html::parse_document(html);

    let title = first_visible(&doc, "h1")
        .or_else(|| first_visible(&doc, "title"))
        .map(|el| text_pieces(el).concat())
        .unwrap_or_default();

    let mut content = String::new();
    for css in platform.selectors() {
        if let Some(el) = first_visible(&doc, css) {
            content = text_pieces(el).join("\n");
            if content.chars().count() > MIN_SELECTOR_CHARS {
                break;
            }
        }
    }
    if content.chars().count() < MIN_SELECTOR_CHARS {
        if let Some(body) = first_visible(&doc, "body") {
            content = text_pieces(body).join("\n");
        }
    }

    let content = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (title, content)
}

/// Naver blogs render the post inside `iframe#mainFrame`.
pub fn main_frame_url(html: &str, page: &Url) -> Option<Url> {
    let doc = Html::parse_document(html);
    let sel = Selector::parse("iframe#mainFrame").ok()?;
    let src = doc.select(&sel).next()?.value().attr("src")?;
    page.join(src).ok()
}

pub struct BlogScraper {
    http: reqwest::Client,
    max_chars: usize,
}

impl BlogScraper {
    pub fn new(cfg: &ScrapeConfig) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            max_chars: cfg.max_chars,
        })
    }

    async fn get_html(&self, url: &Url) -> Result<String, ScrapeError> {
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(status.as_u16()));
        }
        Ok(resp.text().await?)
    }

    pub async fn scrape(&self, raw_url: &str) -> Result<ScrapedContent, ScrapeError> {
        let url = Url::parse(raw_url.trim())
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| ScrapeError::InvalidUrl(raw_url.to_string()))?;
        let platform = Platform::detect(&url);

        let mut html = self.get_html(&url).await?;
        if platform == Platform::Naver {
            if let Some(frame) = main_frame_url(&html, &url) {
                tracing::debug!(target: "scrape", frame = %frame, "following naver mainFrame");
                html = self.get_html(&frame).await?;
            }
        }

        let scraped = finalize(url.as_str(), &html, platform, self.max_chars)?;
        tracing::info!(
            target: "scrape",
            platform = %platform,
            chars = scraped.char_count(),
            "page scraped"
        );
        Ok(scraped)
    }
}

/// Extract, validate and cap.
pub fn finalize(
    url: &str,
    html: &str,
    platform: Platform,
    max_chars: usize,
) -> Result<ScrapedContent, ScrapeError> {
    let (title, content) = extract_content(html, platform);
    if content.chars().count() < MIN_CONTENT_CHARS {
        return Err(ScrapeError::NoContent);
    }
    Ok(ScrapedContent {
        url: url.to_string(),
        title,
        content: content.chars().take(max_chars).collect(),
        source: platform,
    })
}
