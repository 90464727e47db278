//! Instruction template sent to the model along with the extracted terms.

pub const ANALYSIS_PROMPT: &str = r#"You are a consumer-rights assistant reviewing a Terms & Conditions document.

Analyze the document below and answer using EXACTLY this format:

**1. SUMMARY:**
Provide 5-7 bullet points (each line starting with "* ") summarizing the most important terms in plain language.

**2. CONCERNING CLAUSES:**
List every clause a typical user should be worried about. For each clause use:
**Short Clause Title**
A one or two sentence explanation of why the clause is concerning.
Severity: Low|Medium|High
Category: Privacy|Data Usage|Legal Rights|Service Changes|User Content

Put the Severity and Category each on their own line. If there are no concerning clauses, write "No concerning clauses found." under the heading.

Document:
"#;

/// Builds the full prompt, keeping only the first `max_chars` characters of `text`.
pub fn build_prompt(text: &str, max_chars: usize) -> String {
    let excerpt = truncate_chars(text, max_chars);
    if excerpt.len() < text.len() {
        log::info!(
            "[Prompt] Truncated document from {} to {} chars",
            text.chars().count(),
            max_chars
        );
    }
    format!("{}{}", ANALYSIS_PROMPT, excerpt)
}

pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
