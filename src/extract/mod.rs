//! Heuristic location of the legal text on a page.
//!
//! Strategies run in a fixed priority order and the first hit wins. Finding
//! nothing is a normal outcome (`text: None`), not an error.

pub mod frames;
pub mod text;

use crate::extract::frames::FrameLoader;
use crate::extract::text::{char_len, clean_text, cleaned, element_text, is_heading, is_skipped};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

const KNOWN_SELECTOR_MIN: usize = 500;
const HEADING_BLOCK_MIN: usize = 500;
const HEADING_PARENT_MIN: usize = 1000;
const HEADING_PARENT_MAX: usize = 100_000;
const SIBLING_WALK_LIMIT: usize = 100_000;
const IFRAME_MIN: usize = 1000;
const CONTAINER_MIN: usize = 1000;
const BODY_MIN: usize = 1500;

/// Callers need at least this much text before it is worth sending to the model.
pub const MIN_ANALYSIS_CHARS: usize = 100;

pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(3);

const KNOWN_SELECTORS: &[&str] = &[
    "#terms",
    "#terms-of-service",
    "#terms-and-conditions",
    "#terms-of-use",
    "#tos",
    "#eula",
    "#privacy-policy",
    "#legal",
    ".terms",
    ".terms-of-service",
    ".terms-and-conditions",
    ".terms-of-use",
    ".tos",
    ".eula",
    ".privacy-policy",
    ".legal-content",
    ".legal",
    "[id*='terms']",
    "[class*='terms']",
    "[id*='privacy']",
    "[class*='policy']",
];

const HEADING_KEYWORDS: &[&str] = &[
    "terms",
    "conditions",
    "tos",
    "legal",
    "agreement",
    "privacy policy",
    "policy",
    "user agreement",
    "eula",
    "license",
];

const COMMON_CONTAINERS: &[&str] = &[
    "main",
    "article",
    "#content",
    ".content",
    "#main",
    ".main",
    "#main-content",
    ".main-content",
    "[role='main']",
    ".container",
];

lazy_static! {
    static ref KNOWN: Vec<Selector> = KNOWN_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect();
    static ref CONTAINERS: Vec<Selector> = COMMON_CONTAINERS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect();
    static ref HEADINGS: Selector = Selector::parse("h1, h2, h3, h4, h5, h6").unwrap();
    static ref IFRAMES: Selector = Selector::parse("iframe").unwrap();
    static ref TITLE: Selector = Selector::parse("title").unwrap();
    static ref BODY: Selector = Selector::parse("body").unwrap();
    static ref LEGAL_PAGE: Regex =
        Regex::new(r"(?i)terms|conditions|\btos\b|legal|agreement|privacy|policy|eula|licen[cs]e")
            .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    KnownSelector,
    HeadingBlock,
    Iframe,
    CommonContainer,
    WholeBody,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::KnownSelector => "known selector",
            Strategy::HeadingBlock => "heading block",
            Strategy::Iframe => "iframe",
            Strategy::CommonContainer => "common container",
            Strategy::WholeBody => "whole body",
        };
        f.write_str(name)
    }
}

/// A parsed page plus what is known about where it came from.
pub struct PageDocument {
    html: Html,
    url: Option<Url>,
    title: String,
}

impl PageDocument {
    pub fn parse(html: &str, url: Option<Url>) -> Self {
        let html = Html::parse_document(html);
        let title = html
            .select(&TITLE)
            .next()
            .map(|t| clean_text(&element_text(t)))
            .unwrap_or_default();
        Self { html, url, title }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Title or URL mentions terms, privacy, licences and the like.
    pub fn looks_like_terms_page(&self) -> bool {
        LEGAL_PAGE.is_match(&self.title)
            || self
                .url
                .as_ref()
                .is_some_and(|u| LEGAL_PAGE.is_match(u.as_str()))
    }

    fn frame_sources(&self) -> Vec<FrameSource> {
        self.html
            .select(&IFRAMES)
            .filter_map(|frame| {
                let el = frame.value();
                if let Some(doc) = el.attr("srcdoc") {
                    return Some(FrameSource::Inline(doc.to_string()));
                }
                let src = el.attr("src")?.trim();
                let resolved = match &self.url {
                    Some(base) => base.join(src).ok(),
                    None => Url::parse(src).ok(),
                }?;
                matches!(resolved.scheme(), "http" | "https").then_some(FrameSource::Remote(resolved))
            })
            .collect()
    }
}

enum FrameSource {
    /// `srcdoc` content, available without waiting.
    Inline(String),
    Remote(Url),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub text: Option<String>,
    pub strategy: Option<Strategy>,
    pub attempted: Vec<Strategy>,
}

/// Reply shape of the extraction collaborator.
///
/// `error` is set only when extraction itself blew up; `text: None` without an
/// error means nothing substantial was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractResponse {
    pub fn from_result(result: anyhow::Result<Option<String>>) -> Self {
        match result {
            Ok(text) => Self { text, error: None },
            Err(e) => Self {
                text: None,
                error: Some(e.to_string()),
            },
        }
    }
}

pub struct TextExtractor<L: FrameLoader> {
    loader: L,
    frame_timeout: Duration,
}

impl<L: FrameLoader> TextExtractor<L> {
    pub fn new(loader: L, frame_timeout: Duration) -> Self {
        Self {
            loader,
            frame_timeout,
        }
    }

    pub async fn extract(&self, page: &PageDocument) -> Extraction {
        let mut extraction = Extraction::default();
        let is_terms_page = page.looks_like_terms_page();

        extraction.attempted.push(Strategy::KnownSelector);
        if let Some(text) = by_known_selector(&page.html) {
            return finish(extraction, Strategy::KnownSelector, text);
        }

        extraction.attempted.push(Strategy::HeadingBlock);
        if let Some(text) = by_heading(&page.html) {
            return finish(extraction, Strategy::HeadingBlock, text);
        }

        if is_terms_page {
            extraction.attempted.push(Strategy::Iframe);
            if let Some(text) = self.by_iframe(page).await {
                return finish(extraction, Strategy::Iframe, text);
            }

            extraction.attempted.push(Strategy::CommonContainer);
            if let Some(text) = by_common_container(&page.html) {
                return finish(extraction, Strategy::CommonContainer, text);
            }

            extraction.attempted.push(Strategy::WholeBody);
            if let Some(text) = by_body(&page.html) {
                return finish(extraction, Strategy::WholeBody, text);
            }
        } else {
            log::info!(
                "[Extract] Page does not look like a terms page (title: {:?}), skipping fallbacks",
                page.title()
            );
        }

        log::info!("[Extract] No substantial legal text found");
        extraction
    }

    async fn by_iframe(&self, page: &PageDocument) -> Option<String> {
        for source in page.frame_sources() {
            let html = match source {
                FrameSource::Inline(doc) => doc,
                FrameSource::Remote(url) => {
                    match tokio::time::timeout(self.frame_timeout, self.loader.load(&url)).await {
                        Ok(Ok(html)) => html,
                        Ok(Err(e)) => {
                            log::warn!("[Extract] Iframe {} failed: {}", url, e);
                            continue;
                        }
                        Err(_) => {
                            log::warn!(
                                "[Extract] Iframe {} timed out after {:?}",
                                url,
                                self.frame_timeout
                            );
                            continue;
                        }
                    }
                }
            };

            let text = body_text(&Html::parse_document(&html));
            if char_len(&text) > IFRAME_MIN {
                return Some(text);
            }
        }
        None
    }
}

fn finish(mut extraction: Extraction, strategy: Strategy, text: String) -> Extraction {
    log::info!(
        "[Extract] Found {} chars via {}",
        char_len(&text),
        strategy
    );
    extraction.strategy = Some(strategy);
    extraction.text = Some(text);
    extraction
}

fn by_known_selector(html: &Html) -> Option<String> {
    KNOWN.iter().find_map(|selector| {
        html.select(selector)
            .map(cleaned)
            .find(|text| char_len(text) > KNOWN_SELECTOR_MIN)
    })
}

fn by_heading(html: &Html) -> Option<String> {
    for heading in html.select(&HEADINGS) {
        let heading_text = cleaned(heading);
        let lower = heading_text.to_lowercase();
        if heading_text.is_empty() || !HEADING_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }

        if let Some(parent) = heading.parent().and_then(ElementRef::wrap) {
            let parent_text = cleaned(parent);
            if (HEADING_PARENT_MIN..=HEADING_PARENT_MAX).contains(&char_len(&parent_text)) {
                return Some(parent_text);
            }
        }

        let block = collect_following(heading, &heading_text);
        if char_len(&block) > HEADING_BLOCK_MIN {
            return Some(block);
        }
    }
    None
}

/// Concatenates the heading and its following siblings up to the next heading.
fn collect_following(heading: ElementRef<'_>, heading_text: &str) -> String {
    let mut content = heading_text.to_string();
    let mut collected = char_len(&content);

    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        let name = sibling.value().name();
        if is_heading(name) || collected >= SIBLING_WALK_LIMIT {
            break;
        }
        if is_skipped(name) {
            continue;
        }

        let text = cleaned(sibling);
        if text.is_empty() {
            continue;
        }
        content.push_str("\n\n");
        content.push_str(&text);
        collected += 2 + char_len(&text);
    }

    content.trim().to_string()
}

fn by_common_container(html: &Html) -> Option<String> {
    CONTAINERS.iter().find_map(|selector| {
        html.select(selector)
            .next()
            .map(cleaned)
            .filter(|text| char_len(text) > CONTAINER_MIN)
    })
}

fn by_body(html: &Html) -> Option<String> {
    Some(body_text(html)).filter(|text| char_len(text) > BODY_MIN)
}

fn body_text(html: &Html) -> String {
    match html.select(&BODY).next() {
        Some(body) => cleaned(body),
        None => cleaned(html.root_element()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::frames::NoFrames;
    use std::collections::HashMap;

    struct StaticFrames(HashMap<String, String>);

    impl FrameLoader for StaticFrames {
        async fn load(&self, url: &Url) -> anyhow::Result<String> {
            self.0
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("not found"))
        }
    }

    struct SlowFrames;

    impl FrameLoader for SlowFrames {
        async fn load(&self, _url: &Url) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(format!("<body>{}</body>", words(3000)))
        }
    }

    /// Whitespace-separated filler of exactly `len` characters.
    fn words(len: usize) -> String {
        let mut text: String = "lorem ipsum dolor sit amet ".chars().cycle().take(len).collect();
        if text.ends_with(' ') {
            text.pop();
            text.push('x');
        }
        text
    }

    fn page(html: &str, url: Option<&str>) -> PageDocument {
        PageDocument::parse(html, url.map(|u| Url::parse(u).unwrap()))
    }

    fn extractor() -> TextExtractor<NoFrames> {
        TextExtractor::new(NoFrames, DEFAULT_FRAME_TIMEOUT)
    }

    #[tokio::test]
    async fn test_known_selector_wins_without_fallthrough() {
        let terms = words(600);
        let html = format!(
            "<html><head><title>Terms of Service</title></head><body>\
             <h1>Terms of Service</h1><div id=\"terms\">{}</div><main>{}</main></body></html>",
            terms,
            words(2000)
        );
        let result = extractor().extract(&page(&html, None)).await;

        assert_eq!(result.strategy, Some(Strategy::KnownSelector));
        assert_eq!(result.text.as_deref(), Some(terms.as_str()));
        assert_eq!(result.attempted, vec![Strategy::KnownSelector]);
    }

    #[tokio::test]
    async fn test_short_known_selector_is_rejected() {
        let html = format!("<body><div class=\"tos\">{}</div></body>", words(400));
        let result = extractor().extract(&page(&html, None)).await;
        assert_eq!(result.text, None);
    }

    #[tokio::test]
    async fn test_body_below_threshold_yields_absence() {
        let html = format!(
            "<html><head><title>Terms and Conditions</title></head><body><div>{}</div></body></html>",
            words(1200)
        );
        let result = extractor().extract(&page(&html, None)).await;

        assert_eq!(result.text, None);
        assert_eq!(
            result.attempted,
            vec![
                Strategy::KnownSelector,
                Strategy::HeadingBlock,
                Strategy::Iframe,
                Strategy::CommonContainer,
                Strategy::WholeBody,
            ]
        );
    }

    #[tokio::test]
    async fn test_body_fallback_over_threshold() {
        let body = words(1600);
        let html = format!(
            "<html><head><title>Legal</title></head><body><div>{}</div></body></html>",
            body
        );
        let result = extractor().extract(&page(&html, None)).await;

        assert_eq!(result.strategy, Some(Strategy::WholeBody));
        assert_eq!(result.text.as_deref(), Some(body.as_str()));
    }

    #[tokio::test]
    async fn test_fallbacks_need_terms_page() {
        let html = format!(
            "<html><head><title>Recipes</title></head><body><main>{}</main></body></html>",
            words(3000)
        );
        let result = extractor()
            .extract(&page(&html, Some("https://example.com/recipes")))
            .await;

        assert_eq!(result.text, None);
        assert_eq!(
            result.attempted,
            vec![Strategy::KnownSelector, Strategy::HeadingBlock]
        );
    }

    #[tokio::test]
    async fn test_url_marks_terms_page() {
        let html = format!("<body><article>{}</article></body>", words(1100));
        let result = extractor()
            .extract(&page(&html, Some("https://example.com/legal/terms")))
            .await;
        assert_eq!(result.strategy, Some(Strategy::CommonContainer));
    }

    #[tokio::test]
    async fn test_heading_parent_block() {
        let body = words(1200);
        let html = format!(
            "<body><section><h2>Privacy Policy</h2><p>{}</p></section></body>",
            body
        );
        let result = extractor().extract(&page(&html, None)).await;

        assert_eq!(result.strategy, Some(Strategy::HeadingBlock));
        let text = result.text.unwrap();
        assert!(text.starts_with("Privacy Policy"));
        assert!(text.contains(&body));
    }

    #[tokio::test]
    async fn test_heading_sibling_walk_stops_at_next_heading() {
        let first = words(300);
        let second = words(300);
        let html = format!(
            "<body><div><h2>User Agreement</h2><p>{}</p><script>var leak = 1;</script>\
             <p>{}</p><h2>Contact</h2><p>should not appear</p>{}</div></body>",
            first,
            second,
            // Pushes the parent over the upper bound so the walk is used.
            format!("<p>{}</p>", words(100_100))
        );
        let result = extractor().extract(&page(&html, None)).await;

        assert_eq!(result.strategy, Some(Strategy::HeadingBlock));
        let text = result.text.unwrap();
        assert_eq!(text, format!("User Agreement\n\n{}\n\n{}", first, second));
        assert!(!text.contains("leak"));
    }

    #[tokio::test]
    async fn test_inline_iframe_is_used_immediately() {
        let inner = words(1500);
        let html = format!(
            "<html><head><title>EULA</title></head><body>\
             <iframe srcdoc=\"&lt;body&gt;{}&lt;/body&gt;\"></iframe></body></html>",
            inner
        );
        let result = extractor().extract(&page(&html, None)).await;

        assert_eq!(result.strategy, Some(Strategy::Iframe));
        assert_eq!(result.text.as_deref(), Some(inner.as_str()));
    }

    #[tokio::test]
    async fn test_remote_iframe_resolved_against_page_url() {
        let inner = words(1500);
        let mut frames = HashMap::new();
        frames.insert(
            "https://example.com/embed/tos.html".to_string(),
            format!("<html><body><p>{}</p></body></html>", inner),
        );
        let extractor = TextExtractor::new(StaticFrames(frames), DEFAULT_FRAME_TIMEOUT);

        let html = "<body><iframe src=\"/embed/tos.html\"></iframe></body>";
        let result = extractor
            .extract(&page(html, Some("https://example.com/terms")))
            .await;

        assert_eq!(result.strategy, Some(Strategy::Iframe));
        assert_eq!(result.text.as_deref(), Some(inner.as_str()));
    }

    #[tokio::test]
    async fn test_slow_iframe_times_out() {
        let extractor = TextExtractor::new(SlowFrames, Duration::from_millis(50));
        let html = "<html><head><title>Terms</title></head><body>\
                    <iframe src=\"https://example.com/slow\"></iframe></body></html>";
        let result = extractor.extract(&page(html, None)).await;

        assert_eq!(result.text, None);
    }

    #[test]
    fn test_extract_response_shapes() {
        let ok = ExtractResponse::from_result(Ok(None));
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"text":null}"#);

        let err = ExtractResponse::from_result(Err(anyhow::anyhow!("boom")));
        assert_eq!(err.error.as_deref(), Some("boom"));
        assert_eq!(err.text, None);
    }

    #[test]
    fn test_filler_length() {
        assert_eq!(char_len(&words(600)), 600);
        assert_eq!(clean_text(&words(600)), words(600));
    }
}
