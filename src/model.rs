use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder summary used when the model reply has no recognisable summary section.
pub const SUMMARY_PLACEHOLDER: &str = "<p>Summary could not be parsed from the response.</p>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => anyhow::bail!("Unknown severity: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Privacy,
    DataUsage,
    LegalRights,
    ServiceChanges,
    UserContent,
    #[default]
    General,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Privacy,
        Category::DataUsage,
        Category::LegalRights,
        Category::ServiceChanges,
        Category::UserContent,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Privacy => "privacy",
            Category::DataUsage => "data-usage",
            Category::LegalRights => "legal-rights",
            Category::ServiceChanges => "service-changes",
            Category::UserContent => "user-content",
            Category::General => "general",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Privacy => "Privacy",
            Category::DataUsage => "Data Usage",
            Category::LegalRights => "Legal Rights",
            Category::ServiceChanges => "Service Changes",
            Category::UserContent => "User Content",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    /// Accepts both the hyphenated value ("data-usage") and the label form ("Data  Usage").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();

        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", s.trim()))
    }
}

/// One flagged passage of the analysed terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub title: String,
    /// Markup produced by [`crate::markdown::to_markup`].
    pub text: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default)]
    pub concerning_clauses: Vec<Clause>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            summary: SUMMARY_PLACEHOLDER.to_string(),
            concerning_clauses: Vec::new(),
        }
    }
}

impl AnalysisResult {
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.concerning_clauses
            .iter()
            .filter(|c| c.severity == severity)
            .count()
    }
}
