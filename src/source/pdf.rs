use anyhow::{Context, Result};
use lopdf::Document;

pub fn page_error_marker(page: u32) -> String {
    format!("[Page {}: text could not be extracted]", page)
}

/// Decodes every page in order; a page that fails becomes a placeholder line.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let doc = Document::load_mem(bytes).context("Failed to read PDF document")?;
    if doc.is_encrypted() {
        anyhow::bail!("PDF is encrypted and cannot be read");
    }

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    log::info!("[PDF] Decoding {} page(s)", page_numbers.len());

    Ok(collect_pages(page_numbers, |page| {
        doc.extract_text(&[page])
            .map_err(|e| anyhow::anyhow!("{}", e))
    }))
}

pub fn extract_text(bytes: &[u8]) -> Result<String> {
    Ok(extract_pages(bytes)?.join("\n\n"))
}

fn collect_pages(
    page_numbers: impl IntoIterator<Item = u32>,
    mut decode: impl FnMut(u32) -> Result<String>,
) -> Vec<String> {
    page_numbers
        .into_iter()
        .map(|page| match decode(page) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                log::warn!("[PDF] Page {} failed: {}", page, e);
                page_error_marker(page)
            }
        })
        .filter(|text| !text.is_empty())
        .collect()
}

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}
