use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

/// Elements whose content never counts as page text.
pub const SKIPPED_ELEMENTS: &[&str] = &["script", "style"];

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s{2,}").unwrap();
}

/// Text content of `element`, with script/style sub-trees left out.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !is_skipped(child_element.value().name()) {
                collect_text(child_element, out);
            }
        }
    }
}

/// Collapses runs of two or more whitespace characters to one space and trims.
pub fn clean_text(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw, " ").trim().to_string()
}

pub fn cleaned(element: ElementRef<'_>) -> String {
    clean_text(&element_text(element))
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn is_skipped(name: &str) -> bool {
    SKIPPED_ELEMENTS.iter().any(|s| name.eq_ignore_ascii_case(s))
}

pub fn is_heading(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}
