use crate::markdown;
use crate::model::{AnalysisResult, Category, Clause, Severity};
use chrono::{DateTime, Local};
use std::fmt;
use std::str::FromStr;

pub const EXPORT_HEADER: &str = "TERMS & CONDITIONS ANALYSIS";
pub const EXPORT_DIVIDER: &str = "--------------------------------------------------";

/// Stable sort putting every `high` clause ahead of the rest.
///
/// Medium and low are deliberately not re-ranked against each other.
pub fn sort_by_severity(clauses: &mut [Clause]) {
    clauses.sort_by_key(|c| c.severity != Severity::High);
}

/// The single active list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Severity(Severity),
    Category(Category),
}

impl Filter {
    pub fn matches(&self, clause: &Clause) -> bool {
        match self {
            Filter::All => true,
            Filter::Severity(s) => clause.severity == *s,
            Filter::Category(c) => clause.category == *c,
        }
    }
}

impl FromStr for Filter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case("all") {
            return Ok(Filter::All);
        }
        if let Ok(severity) = value.parse::<Severity>() {
            return Ok(Filter::Severity(severity));
        }
        value
            .parse::<Category>()
            .map(Filter::Category)
            .map_err(|_| anyhow::anyhow!("Unknown filter '{}': use all, a severity or a category", value))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("all"),
            Filter::Severity(s) => write!(f, "{}", s),
            Filter::Category(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClauseItem<'a> {
    pub clause: &'a Clause,
    pub visible: bool,
}

/// Filterable view over the clauses of one result.
pub struct ClausePresenter<'a> {
    result: &'a AnalysisResult,
    items: Vec<ClauseItem<'a>>,
    filter: Filter,
}

impl<'a> ClausePresenter<'a> {
    pub fn new(result: &'a AnalysisResult) -> Self {
        let items = result
            .concerning_clauses
            .iter()
            .map(|clause| ClauseItem {
                clause,
                visible: true,
            })
            .collect();

        Self {
            result,
            items,
            filter: Filter::All,
        }
    }

    /// Replaces the active filter and re-evaluates every item from scratch.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        for item in &mut self.items {
            item.visible = filter.matches(item.clause);
        }
    }

    pub fn visible(&self) -> impl Iterator<Item = &'a Clause> + '_ {
        self.items.iter().filter(|i| i.visible).map(|i| i.clause)
    }

    pub fn visible_count(&self) -> usize {
        self.items.iter().filter(|i| i.visible).count()
    }

    pub fn render_terminal(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Concerning clauses: {} (high: {}, medium: {}, low: {}) | filter: {} | showing {}\n",
            self.items.len(),
            self.result.count_by_severity(Severity::High),
            self.result.count_by_severity(Severity::Medium),
            self.result.count_by_severity(Severity::Low),
            self.filter,
            self.visible_count()
        ));

        for clause in self.visible() {
            out.push('\n');
            out.push_str(&format!(
                "[{}] [{}] {}\n",
                clause.severity.as_str().to_uppercase(),
                clause.category,
                clause.title
            ));
            for line in markdown::to_plain_text(&clause.text).lines() {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
        }

        out
    }

    /// Markup list of all clauses, tagged for client-side filtering.
    pub fn render_list(&self) -> String {
        let mut out = String::from("<ul class=\"clause-list\">\n");
        for item in &self.items {
            let clause = item.clause;
            out.push_str(&format!(
                "<li class=\"clause severity-{sev} category-{cat}\" data-severity=\"{sev}\" data-category=\"{cat}\"{hidden}>\
                 <h3>{title}</h3><div class=\"tags\"><span class=\"tag severity\">{sev_label}</span>\
                 <span class=\"tag category\">{cat_label}</span></div><div class=\"body\">{text}</div></li>\n",
                sev = clause.severity,
                cat = clause.category,
                hidden = if item.visible { "" } else { " hidden" },
                title = markdown::escape_html(&clause.title),
                sev_label = clause.severity.label(),
                cat_label = clause.category.label(),
                text = clause.text,
            ));
        }
        out.push_str("</ul>");
        out
    }

    /// Plain-text export of the clauses passing the active filter.
    pub fn export_visible(&self) -> String {
        export_clauses(self.visible())
    }
}

pub fn export_summary(result: &AnalysisResult) -> String {
    markdown::to_plain_text(&result.summary)
}

pub fn export_clauses<'c>(clauses: impl IntoIterator<Item = &'c Clause>) -> String {
    let mut out = String::new();
    for clause in clauses {
        out.push_str(&format!("### {} ###\n", clause.title));
        out.push_str(&format!(
            "(Severity: {}, Category: {})\n\n",
            clause.severity.label(),
            clause.category.label()
        ));
        out.push_str(&markdown::to_plain_text(&clause.text));
        out.push_str("\n\n");
        out.push_str(EXPORT_DIVIDER);
        out.push_str("\n\n");
    }
    out
}

pub fn export_document(
    result: &AnalysisResult,
    source: Option<&str>,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    out.push_str(EXPORT_HEADER);
    out.push('\n');
    out.push_str(&format!("Generated: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S")));
    if let Some(source) = source {
        out.push_str(&format!("Source: {}\n", source));
    }
    out.push_str("==================================================\n\n");

    out.push_str("Summary\n-------\n");
    out.push_str(&export_summary(result));
    out.push_str("\n\n");

    out.push_str("Concerning Clauses\n------------------\n\n");
    if result.concerning_clauses.is_empty() {
        out.push_str("No concerning clauses were identified.\n");
    } else {
        out.push_str(&export_clauses(&result.concerning_clauses));
    }

    out
}
