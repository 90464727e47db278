//! Minimal inline markdown to markup conversion, and the way back to plain text.
//!
//! The markup vocabulary is a small HTML subset: `<strong>`, `<em>`, `<code>`,
//! `<br>`, `<ul>`/`<li>` and `<p>`. Anything else in model output is escaped.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;

pub const LINE_BREAK: &str = "<br>";

lazy_static! {
    static ref BOLD_STARS: Regex = Regex::new(r"\*\*(.+?)\*\*").unwrap();
    static ref BOLD_UNDERSCORES: Regex = Regex::new(r"__(.+?)__").unwrap();
    static ref INLINE_CODE: Regex = Regex::new(r"`([^`]+)`").unwrap();

    static ref BREAK_TAG: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref LIST_ITEM_OPEN: Regex = Regex::new(r"(?i)<li(?:\s[^>]*)?>").unwrap();
    static ref BLOCK_CLOSE: Regex = Regex::new(r"(?i)</(?:li|ul)>").unwrap();
    static ref PARAGRAPH_CLOSE: Regex = Regex::new(r"(?i)</p>").unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref EXCESS_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Converts model text to markup, line by line.
///
/// Plain text passes through unchanged apart from line breaks, except that
/// `&`, `<`, `>` and `"` are HTML-escaped; [`to_plain_text`] decodes them back.
pub fn to_markup(text: &str) -> String {
    text.lines()
        .map(|line| strip_list_marker(line.trim()).trim())
        .filter(|line| !line.is_empty())
        .map(convert_inline)
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

/// Wraps already-converted items as an unordered list.
pub fn to_list(items: &[String]) -> String {
    let mut out = String::from("<ul>");
    for item in items {
        out.push_str("<li>");
        out.push_str(item);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

pub fn to_paragraph(markup: &str) -> String {
    format!("<p>{}</p>", markup)
}

/// Flattens markup back to plain text for export.
pub fn to_plain_text(markup: &str) -> String {
    let prepared = BREAK_TAG.replace_all(markup, "\n");
    let prepared = LIST_ITEM_OPEN.replace_all(&prepared, "- ");
    let prepared = BLOCK_CLOSE.replace_all(&prepared, "\n");
    let prepared = PARAGRAPH_CLOSE.replace_all(&prepared, "\n\n");

    let fragment = Html::parse_fragment(&prepared);
    let text = if fragment.errors.is_empty() {
        fragment.root_element().text().collect::<String>()
    } else {
        log::debug!(
            "[Markdown] Markup parse reported {} error(s), stripping tags instead",
            fragment.errors.len()
        );
        decode_entities(&ANY_TAG.replace_all(&prepared, ""))
    };

    EXCESS_NEWLINES
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}

fn strip_list_marker(line: &str) -> &str {
    line.strip_prefix("* ")
        .or_else(|| line.strip_prefix("- "))
        .unwrap_or(line)
}

fn convert_inline(line: &str) -> String {
    let escaped = escape_html(line);
    let bolded = BOLD_STARS.replace_all(&escaped, "<strong>$1</strong>");
    let bolded = BOLD_UNDERSCORES.replace_all(&bolded, "<strong>$1</strong>");
    let italic = wrap_single_delimited(&bolded, '*');
    let italic = wrap_single_delimited(&italic, '_');
    INLINE_CODE
        .replace_all(&italic, "<code>$1</code>")
        .into_owned()
}

/// Wraps `<em>` around spans enclosed by a single `delim`.
///
/// A delimiter adjacent to another copy of itself is never treated as italic,
/// so leftover `**` can't turn into nested emphasis. Underscores additionally
/// need a non-word character outside the span (`snake_case` stays as is).
fn wrap_single_delimited(line: &str, delim: char) -> String {
    let chars: Vec<char> = line.chars().collect();
    let word_bound = delim == '_';
    let mut out = String::with_capacity(line.len());
    let mut i = 0;

    while i < chars.len() {
        if let Some(close) = find_span(&chars, i, delim, word_bound) {
            out.push_str("<em>");
            out.extend(&chars[i + 1..close]);
            out.push_str("</em>");
            i = close + 1;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }

    out
}

fn find_span(chars: &[char], open: usize, delim: char, word_bound: bool) -> Option<usize> {
    let is_delim = |idx: Option<usize>| idx.and_then(|i| chars.get(i)).is_some_and(|c| *c == delim);
    let is_word = |idx: Option<usize>| {
        idx.and_then(|i| chars.get(i))
            .is_some_and(|c| c.is_alphanumeric())
    };

    if chars[open] != delim || is_delim(open.checked_sub(1)) || is_delim(Some(open + 1)) {
        return None;
    }
    if word_bound && is_word(open.checked_sub(1)) {
        return None;
    }
    match chars.get(open + 1) {
        Some(c) if !c.is_whitespace() => {}
        _ => return None,
    }

    let mut j = open + 2;
    while j < chars.len() {
        if chars[j] == delim {
            if is_delim(Some(j + 1)) {
                // Skip the whole run; it can't close this span.
                while j < chars.len() && chars[j] == delim {
                    j += 1;
                }
                continue;
            }
            let closes = !chars[j - 1].is_whitespace()
                && chars[j - 1] != delim
                && !(word_bound && is_word(Some(j + 1)));
            if closes {
                return Some(j);
            }
        }
        j += 1;
    }

    None
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
