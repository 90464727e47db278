use anyhow::{anyhow, Result};
use headless_chrome::{Browser, LaunchOptions};
use std::time::Duration;

/// HTML of a page after scripts have run, as rendered by headless Chrome.
pub struct RenderedPage {
    pub html: String,
    pub url: String,
}

/// Loads `url` in a throwaway headless browser. Blocking; call from `spawn_blocking`.
pub fn render_page(url: &str, settle: Duration) -> Result<RenderedPage> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .enable_gpu(false)
        .build()
        .map_err(|e| anyhow!("Failed to build browser options: {}", e))?;

    let browser = Browser::new(options).map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

    let tab = browser
        .new_tab()
        .map_err(|e| anyhow!("Failed to open tab: {}", e))?;

    log::info!("[Browser] Navigating to {}", url);
    tab.navigate_to(url)
        .map_err(|e| anyhow!("Failed to navigate: {}", e))?;
    tab.wait_until_navigated()
        .map_err(|e| anyhow!("Navigation timeout: {}", e))?;

    // Late-loading terms widgets.
    std::thread::sleep(settle);

    let html = tab
        .get_content()
        .map_err(|e| anyhow!("Failed to read page content: {}", e))?;

    Ok(RenderedPage {
        html,
        url: tab.get_url(),
    })
}

pub async fn render_page_async(url: String, settle: Duration) -> Result<RenderedPage> {
    tokio::task::spawn_blocking(move || render_page(&url, settle))
        .await
        .map_err(|e| anyhow!("Browser task failed: {}", e))?
}
