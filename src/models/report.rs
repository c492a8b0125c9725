use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Report sections in the order they are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, IntoStaticStr)]
pub enum SectionKind {
    #[strum(serialize = "ExecutiveSummary")]
    Summary,
    Introduction,
    Findings,
    #[strum(serialize = "Results")]
    DetailedResults,
    Recommendations,
    Conclusion,
    Metadata,
}

impl SectionKind {
    /// Key of this section in the service's result mapping.
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn title(self) -> String {
        self.key().replace('_', " ")
    }
}

/// One named piece of a completed report. Content is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub kind: SectionKind,
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub issue: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[strum(default)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallGrade {
    pub grade: String,
    #[serde(default)]
    pub security_level: String,
    #[serde(default)]
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueCount {
    #[serde(rename = "Severity")]
    pub severity: String,
    #[serde(default)]
    pub issues: u64,
}

impl IssueCount {
    pub fn severity(&self) -> Severity {
        // strum's default variant makes this infallible
        self.severity
            .parse()
            .unwrap_or_else(|_| Severity::Other(self.severity.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub vulnerability: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub description: String,
}

/// The detailed results section: grades, issue counts and vulnerabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedResults {
    #[serde(default)]
    pub overall_result: Vec<OverallGrade>,
    #[serde(default)]
    pub issues: Vec<IssueCount>,
    #[serde(default, rename = "Vulnerabilities")]
    pub vulnerabilities: Vec<Vulnerability>,
}

impl DetailedResults {
    pub fn total_issues(&self) -> u64 {
        self.issues.iter().map(|i| i.issues).sum()
    }

    /// Share of all issues at each severity, as a percentage rounded to 0.1.
    pub fn distribution(&self) -> Vec<(Severity, f64)> {
        let total = self.total_issues();
        self.issues
            .iter()
            .map(|i| {
                let pct = if total == 0 {
                    0.0
                } else {
                    (i.issues as f64 / total as f64 * 1000.0).round() / 10.0
                };
                (i.severity(), pct)
            })
            .collect()
    }
}

/// How a metadata value should be presented.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MetadataValue {
    /// A string the timestamp rule matched; raw text is kept.
    Timestamp(String),
    Text(String),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataEntry {
    pub key: String,
    pub label: String,
    pub value: MetadataValue,
}

/// An image extracted from the analysed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportImage {
    pub page_number: u32,
    pub base64_image: String,
}

impl ReportImage {
    pub fn file_name(&self) -> String {
        format!("image-{}.png", self.page_number)
    }
}
