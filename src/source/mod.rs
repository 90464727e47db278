//! Where the document comes from: a URL, a local file, or a rendered browser tab.

pub mod pdf;

use crate::browser;
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use url::Url;

const RENDER_SETTLE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Page,
    Pdf,
}

impl SourceKind {
    /// User-facing message when too little text was found.
    pub fn insufficient_text_message(&self) -> &'static str {
        match self {
            SourceKind::Page => {
                "Could not find enough Terms & Conditions text on this page. Try the page that contains the full terms."
            }
            SourceKind::Pdf => {
                "Could not extract enough text from this PDF. It may be scanned or image-only."
            }
        }
    }
}

pub enum LoadedSource {
    Page { html: String, url: Option<Url> },
    Pdf { bytes: Vec<u8> },
}

impl LoadedSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            LoadedSource::Page { .. } => SourceKind::Page,
            LoadedSource::Pdf { .. } => SourceKind::Pdf,
        }
    }
}

pub fn is_remote(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn has_pdf_extension(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".pdf")
}

pub async fn load(source: &str, client: &Client, render: bool) -> Result<LoadedSource> {
    let source = source.trim();
    if is_remote(source) {
        let url = Url::parse(source).with_context(|| format!("Invalid URL: {}", source))?;
        if render && !has_pdf_extension(url.path()) {
            let page = browser::render_page_async(url.to_string(), RENDER_SETTLE).await?;
            let url = Url::parse(&page.url).ok().or(Some(url));
            return Ok(LoadedSource::Page {
                html: page.html,
                url,
            });
        }
        fetch(url, client).await
    } else {
        read_file(Path::new(source))
    }
}

async fn fetch(url: Url, client: &Client) -> Result<LoadedSource> {
    log::info!("[Source] Fetching {}", url);

    let res = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch {}: {}", url, e))?;

    let status = res.status();
    if !status.is_success() {
        anyhow::bail!("Failed to fetch {}: HTTP {}", url, status.as_u16());
    }

    let final_url = res.url().clone();
    let is_pdf_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("application/pdf"));

    let bytes = res
        .bytes()
        .await
        .with_context(|| format!("Failed to read body of {}", url))?;

    if is_pdf_type || has_pdf_extension(final_url.path()) || pdf::looks_like_pdf(&bytes) {
        return Ok(LoadedSource::Pdf {
            bytes: bytes.to_vec(),
        });
    }

    Ok(LoadedSource::Page {
        html: String::from_utf8_lossy(&bytes).into_owned(),
        url: Some(final_url),
    })
}

fn read_file(path: &Path) -> Result<LoadedSource> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;

    if has_pdf_extension(&path.to_string_lossy()) || pdf::looks_like_pdf(&bytes) {
        return Ok(LoadedSource::Pdf { bytes });
    }

    let url = path
        .canonicalize()
        .ok()
        .and_then(|p| Url::from_file_path(p).ok());

    Ok(LoadedSource::Page {
        html: String::from_utf8_lossy(&bytes).into_owned(),
        url,
    })
}
