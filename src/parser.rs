//! Turns the model's loosely formatted reply into an [`AnalysisResult`].
//!
//! Parsing never fails. Missing sections fall back to [`SUMMARY_PLACEHOLDER`]
//! and an empty clause list, and blocks without a title or body are dropped.

use crate::markdown;
use crate::model::{AnalysisResult, Category, Clause, Severity, SUMMARY_PLACEHOLDER};
use crate::presenter;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SUMMARY_MARKER: Regex =
        Regex::new(r"(?i)\*\*\s*1\.\s*summary\s*:?\s*\*\*").unwrap();
    static ref CLAUSES_MARKER: Regex =
        Regex::new(r"(?i)\*\*\s*2\.\s*concerning\s+clauses\s*:?\s*\*\*").unwrap();

    static ref BULLET_LINE: Regex = Regex::new(r"(?m)^[ \t]*[*-][ \t]+(.*)$").unwrap();
    // A bold run that is the whole line, or one closed by a colon (`**Title:**`, `**Title**:`).
    static ref BLOCK_START: Regex =
        Regex::new(r"(?m)^[ \t]*(?:[*-][ \t]+)?\*\*[^*\n]+?(?::\*\*|\*\*[ \t]*(?::|$))").unwrap();
    static ref TITLE: Regex = Regex::new(r"^(?:[*-][ \t]+)?\*\*(.+?)\*\*").unwrap();

    static ref SEVERITY: Regex =
        Regex::new(r"(?i)severity\s*:\s*\**\s*(high|medium|low)\b").unwrap();
    static ref CATEGORY: Regex = Regex::new(
        r"(?i)category\s*:\s*\**\s*(privacy|data[\s-]+usage|legal[\s-]+rights|service[\s-]+changes|user[\s-]+content)\b"
    )
    .unwrap();
    static ref LABEL_LINE: Regex = Regex::new(
        r"(?im)^[ \t]*(?:[*-][ \t]+)?\**[ \t]*(?:severity|category)[ \t]*\**[ \t]*:[ \t]*\**[ \t]*[a-z][a-z \t-]*\**[ \t]*\.?[ \t]*$"
    )
    .unwrap();
    static ref NO_CLAUSES: Regex = Regex::new(r"(?i)no\s+concerning\s+clauses").unwrap();
}

/// What the parser saw, for logging only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParseDiagnostics {
    pub summary_found: bool,
    pub clauses_section_found: bool,
    pub explicitly_none: bool,
    pub dropped_blocks: usize,
}

pub fn parse_response(raw: &str) -> AnalysisResult {
    parse_with_diagnostics(raw).0
}

pub fn parse_with_diagnostics(raw: &str) -> (AnalysisResult, ParseDiagnostics) {
    let text = raw.replace("\r\n", "\n");
    let mut diagnostics = ParseDiagnostics::default();
    let mut result = AnalysisResult::default();

    let clauses_marker = CLAUSES_MARKER.find(&text);

    if let Some(summary_marker) = SUMMARY_MARKER.find(&text) {
        diagnostics.summary_found = true;
        let end = clauses_marker
            .filter(|m| m.start() >= summary_marker.end())
            .map(|m| m.start())
            .unwrap_or(text.len());
        if let Some(summary) = parse_summary(&text[summary_marker.end()..end]) {
            result.summary = summary;
        }
    } else {
        log::warn!("[Parser] Summary section marker not found, keeping placeholder");
    }

    match clauses_marker {
        Some(marker) => {
            diagnostics.clauses_section_found = true;
            let section = &text[marker.end()..];
            diagnostics.explicitly_none = NO_CLAUSES.is_match(section);

            for block in split_blocks(section) {
                match parse_clause(&block) {
                    Some(clause) => result.concerning_clauses.push(clause),
                    None => {
                        diagnostics.dropped_blocks += 1;
                        log::debug!("[Parser] Dropping block without title or body: {:?}", block);
                    }
                }
            }
        }
        None => log::info!("[Parser] No concerning clauses section in response"),
    }

    presenter::sort_by_severity(&mut result.concerning_clauses);

    log::info!(
        "[Parser] Parsed {} clause(s) (summary: {}, clauses section: {}, stated none: {}, dropped: {})",
        result.concerning_clauses.len(),
        diagnostics.summary_found,
        diagnostics.clauses_section_found,
        diagnostics.explicitly_none,
        diagnostics.dropped_blocks
    );

    (result, diagnostics)
}

fn parse_summary(span: &str) -> Option<String> {
    if span.trim().is_empty() {
        return None;
    }

    let bullets: Vec<&str> = BULLET_LINE
        .captures_iter(span)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    if bullets.is_empty() {
        return Some(markdown::to_paragraph(&markdown::to_markup(span.trim())));
    }

    let items: Vec<String> = bullets
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(markdown::to_markup)
        .collect();

    Some(markdown::to_list(&items))
}

/// Splits the clause section at standalone bold title lines.
///
/// A bold run followed by more prose on the same line is emphasis inside an
/// explanation, and a bold Severity/Category label is not a title; neither
/// opens a block.
fn split_blocks(section: &str) -> Vec<String> {
    let mut starts = vec![0];
    for m in BLOCK_START.find_iter(section) {
        let line_end = section[m.start()..]
            .find('\n')
            .map(|i| m.start() + i)
            .unwrap_or(section.len());
        if LABEL_LINE.is_match(&section[m.start()..line_end]) {
            continue;
        }
        if m.start() != 0 {
            starts.push(m.start());
        }
    }
    starts.push(section.len());

    starts
        .windows(2)
        .map(|pair| section[pair[0]..pair[1]].trim())
        .filter(|block| !block.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_clause(block: &str) -> Option<Clause> {
    let caps = TITLE.captures(block)?;
    let title = caps
        .get(1)?
        .as_str()
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_string();
    if title.is_empty() {
        return None;
    }

    let severity = SEVERITY
        .captures(block)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<Severity>().ok())
        .unwrap_or_default();

    let category = CATEGORY
        .captures(block)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<Category>().ok())
        .unwrap_or_default();

    let rest = &block[caps.get(0)?.end()..];
    let explanation = LABEL_LINE.replace_all(rest, "");
    let explanation = explanation.trim().trim_start_matches(':').trim();

    let text = markdown::to_markup(explanation);
    if text.is_empty() {
        return None;
    }

    Some(Clause {
        title,
        text,
        severity,
        category,
    })
}
