use anyhow::Result;
use arboard::Clipboard;

pub struct ClipboardManager;

impl ClipboardManager {
    /// Single attempt; a busy clipboard is reported, not retried.
    pub fn write(text: &str) -> Result<()> {
        let mut clipboard =
            Clipboard::new().map_err(|e| anyhow::anyhow!("Clipboard unavailable: {}", e))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| anyhow::anyhow!("Failed to write to clipboard: {}", e))?;
        Ok(())
    }
}
