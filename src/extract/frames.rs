use anyhow::{Context, Result};
use reqwest::Client;
use url::Url;

/// Loads the document behind an iframe `src`.
///
/// The extractor bounds every call with its own timeout, so implementations
/// don't need one.
#[allow(async_fn_in_trait)]
pub trait FrameLoader {
    async fn load(&self, url: &Url) -> Result<String>;
}

pub struct HttpFrameLoader {
    client: Client,
}

impl HttpFrameLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl FrameLoader for HttpFrameLoader {
    async fn load(&self, url: &Url) -> Result<String> {
        log::debug!("[Frames] Loading iframe {}", url);

        let res = self
            .client
            .get(url.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to load iframe {}", url))?;

        if !res.status().is_success() {
            anyhow::bail!("Iframe {} returned status {}", url, res.status());
        }

        Ok(res.text().await?)
    }
}

/// Loader for pages without network access (local files).
pub struct NoFrames;

impl FrameLoader for NoFrames {
    async fn load(&self, url: &Url) -> Result<String> {
        anyhow::bail!("Remote iframe {} not loaded for local documents", url)
    }
}
