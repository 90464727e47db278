use crate::config::Config;
use crate::extract::frames::{FrameLoader, HttpFrameLoader, NoFrames};
use crate::extract::text::char_len;
use crate::extract::{PageDocument, Strategy, TextExtractor, MIN_ANALYSIS_CHARS};
use crate::llm::LlmClient;
use crate::model::AnalysisResult;
use crate::parser;
use crate::source::{self, pdf, LoadedSource, SourceKind};
use anyhow::Result;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub kind: SourceKind,
    pub text: Option<String>,
    pub strategy: Option<Strategy>,
}

impl ExtractedDocument {
    /// Text long enough to be worth analysing, or the user-facing reason it isn't.
    pub fn analyzable_text(&self) -> Result<&str> {
        match self.text.as_deref() {
            Some(text) if char_len(text) > MIN_ANALYSIS_CHARS => Ok(text),
            _ => anyhow::bail!("{}", self.kind.insufficient_text_message()),
        }
    }
}

pub async fn extract(
    source: &str,
    config: &Config,
    client: &Client,
    render: bool,
) -> Result<ExtractedDocument> {
    let loaded = source::load(source, client, render).await?;
    let kind = loaded.kind();

    match loaded {
        LoadedSource::Pdf { bytes } => {
            let text = tokio::task::spawn_blocking(move || pdf::extract_text(&bytes))
                .await
                .map_err(|e| anyhow::anyhow!("PDF decode task failed: {}", e))??;
            Ok(ExtractedDocument {
                kind,
                text: Some(text).filter(|t| !t.trim().is_empty()),
                strategy: None,
            })
        }
        LoadedSource::Page { html, url } => {
            let is_remote = url
                .as_ref()
                .is_some_and(|u| matches!(u.scheme(), "http" | "https"));
            let page = PageDocument::parse(&html, url);
            let timeout = Duration::from_secs(config.extraction.iframe_timeout_secs);

            let extraction = if is_remote {
                run_extractor(HttpFrameLoader::new(client.clone()), timeout, &page).await
            } else {
                run_extractor(NoFrames, timeout, &page).await
            };

            Ok(ExtractedDocument {
                kind,
                text: extraction.text,
                strategy: extraction.strategy,
            })
        }
    }
}

async fn run_extractor<L: FrameLoader>(
    loader: L,
    timeout: Duration,
    page: &PageDocument,
) -> crate::extract::Extraction {
    TextExtractor::new(loader, timeout).extract(page).await
}

/// Full run: extract, ask the model, parse its reply.
pub async fn analyze(
    source: &str,
    config: &Config,
    client: &Client,
    render: bool,
) -> Result<AnalysisResult> {
    let document = extract(source, config, client, render).await?;
    let text = document.analyzable_text()?;

    log::info!(
        "[Pipeline] Analysing {} chars from {} ({:?})",
        char_len(text),
        source,
        document.strategy
    );

    let raw = LlmClient::analyze(client, text, config).await?;
    log::debug!("[Pipeline] Raw model reply:\n{}", raw);

    Ok(parser::parse_response(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_rejected_with_source_message() {
        let doc = ExtractedDocument {
            kind: SourceKind::Pdf,
            text: Some("too short".to_string()),
            strategy: None,
        };
        let err = doc.analyzable_text().unwrap_err();
        assert_eq!(err.to_string(), SourceKind::Pdf.insufficient_text_message());

        let doc = ExtractedDocument {
            kind: SourceKind::Page,
            text: None,
            strategy: None,
        };
        let err = doc.analyzable_text().unwrap_err();
        assert_eq!(err.to_string(), SourceKind::Page.insufficient_text_message());
    }

    #[test]
    fn test_long_text_is_accepted() {
        let doc = ExtractedDocument {
            kind: SourceKind::Page,
            text: Some("x".repeat(101)),
            strategy: Some(Strategy::WholeBody),
        };
        assert_eq!(doc.analyzable_text().unwrap().len(), 101);
    }

    #[tokio::test]
    async fn test_broken_pdf_file_yields_no_text() {
        let dir = std::env::temp_dir().join(format!("terms_lens_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4 not really a pdf").unwrap();

        let config = Config::default();
        let result = extract(path.to_str().unwrap(), &config, &Client::new(), false).await;
        match result {
            Err(e) => assert!(e.to_string().contains("PDF")),
            Ok(doc) => {
                assert_eq!(doc.kind, SourceKind::Pdf);
                assert!(doc.analyzable_text().is_err());
            }
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_extract_local_terms_file() {
        let dir = std::env::temp_dir().join(format!("terms_lens_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("terms.html");
        let body = "We reserve the right to change these terms at any time. ".repeat(12);
        std::fs::write(
            &path,
            format!("<html><body><div id=\"terms\">{}</div></body></html>", body),
        )
        .unwrap();

        let config = Config::default();
        let client = Client::new();
        let doc = extract(path.to_str().unwrap(), &config, &client, false)
            .await
            .unwrap();

        assert_eq!(doc.kind, SourceKind::Page);
        assert_eq!(doc.strategy, Some(Strategy::KnownSelector));
        assert_eq!(doc.text.as_deref(), Some(body.trim()));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
