//! Standalone HTML page for the `view` surface.

use crate::handoff::HandoffRecord;
use crate::markdown::escape_html;
use crate::model::{Category, Severity};
use crate::presenter::ClausePresenter;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const REPORT_FILE: &str = "report.html";

// One radio group; every change re-evaluates every item.
const FILTER_SCRIPT: &str = r#"<script>
document.querySelectorAll('input[name="filter"]').forEach(function (radio) {
  radio.addEventListener('change', function () {
    var value = radio.value;
    document.querySelectorAll('li.clause').forEach(function (item) {
      var show = value === 'all' || item.dataset.severity === value || item.dataset.category === value;
      item.hidden = !show;
    });
  });
});
</script>"#;

pub fn render_report(record: &HandoffRecord) -> String {
    let presenter = ClausePresenter::new(&record.result);
    let result = &record.result;

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Terms &amp; Conditions Analysis</title>\n");
    html.push_str(
        "<style>body{font-family:sans-serif;max-width:50em;margin:2em auto}\
         .severity-high h3{color:#b00020}.tag{margin-right:.5em;font-size:.8em}</style>\n",
    );
    html.push_str("</head>\n<body>\n");

    html.push_str("<h1>Terms &amp; Conditions Analysis</h1>\n");
    html.push_str(&format!(
        "<p class=\"source\">{} &middot; {}</p>\n",
        escape_html(&record.source),
        record.created_at.format("%Y-%m-%d %H:%M UTC")
    ));

    html.push_str("<h2>Summary</h2>\n<div class=\"summary\">");
    html.push_str(&result.summary);
    html.push_str("</div>\n");

    html.push_str(&format!(
        "<h2>Concerning Clauses ({})</h2>\n",
        result.concerning_clauses.len()
    ));
    if result.concerning_clauses.is_empty() {
        html.push_str("<p>No concerning clauses were identified.</p>\n");
    } else {
        html.push_str(&filter_controls());
        html.push_str(&presenter.render_list());
        html.push('\n');
        html.push_str(FILTER_SCRIPT);
        html.push('\n');
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn filter_controls() -> String {
    let mut out = String::from("<form class=\"filters\">\n");
    out.push_str("<label><input type=\"radio\" name=\"filter\" value=\"all\" checked> All</label>\n");
    for severity in Severity::ALL {
        out.push_str(&format!(
            "<label><input type=\"radio\" name=\"filter\" value=\"{}\"> {}</label>\n",
            severity,
            severity.label()
        ));
    }
    for category in Category::ALL {
        out.push_str(&format!(
            "<label><input type=\"radio\" name=\"filter\" value=\"{}\"> {}</label>\n",
            category,
            category.label()
        ));
    }
    out.push_str("</form>\n");
    out
}

pub fn write_report(data_dir: &Path, record: &HandoffRecord) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)?;
    let path = data_dir.join(REPORT_FILE);
    fs::write(&path, render_report(record)).context("Failed to write report")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisResult, Clause};
    use chrono::Utc;
    use uuid::Uuid;

    fn record(clauses: Vec<Clause>) -> HandoffRecord {
        HandoffRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source: "https://example.com/terms?a=1&b=<2>".to_string(),
            result: AnalysisResult {
                summary: "<ul><li>Point</li></ul>".to_string(),
                concerning_clauses: clauses,
            },
        }
    }

    #[test]
    fn test_report_contains_summary_and_clauses() {
        let html = render_report(&record(vec![Clause {
            title: "Arbitration <forced>".to_string(),
            text: "You waive <strong>class actions</strong>.".to_string(),
            severity: Severity::High,
            category: Category::LegalRights,
        }]));

        assert!(html.contains("<div class=\"summary\"><ul><li>Point</li></ul></div>"));
        assert!(html.contains("Arbitration &lt;forced&gt;"));
        assert!(html.contains("<strong>class actions</strong>"));
        assert!(html.contains("value=\"legal-rights\""));
        assert!(html.contains("a=1&amp;b=&lt;2&gt;"));
    }

    #[test]
    fn test_report_without_clauses_has_no_filters() {
        let html = render_report(&record(Vec::new()));
        assert!(html.contains("No concerning clauses were identified."));
        assert!(!html.contains("name=\"filter\""));
    }
}
