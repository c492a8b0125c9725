//! Turns a completed job's result mapping into ordered report sections.
//!
//! Sections follow a fixed canonical order and absent or empty entries are
//! dropped. Content is handed to consumers as-is; the typed accessors below
//! only reinterpret it on request.

use chrono::{DateTime, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use crate::models::report::{
    DetailedResults, Finding, MetadataEntry, MetadataValue, Recommendation, ReportImage,
    ReportSection, SectionKind,
};

/// Key under which extracted images travel alongside the sections.
const IMAGES_KEY: &str = "images";

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    sections: Vec<ReportSection>,
    raw: Map<String, Value>,
}

impl Report {
    pub fn materialize(result: &Map<String, Value>) -> Self {
        let sections = SectionKind::iter()
            .filter_map(|kind| {
                let content = result.get(kind.key())?;
                is_present(content).then(|| ReportSection {
                    kind,
                    content: content.clone(),
                })
            })
            .collect();

        Self {
            sections,
            raw: result.clone(),
        }
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn findings(&self) -> Vec<Finding> {
        self.typed(SectionKind::Findings).unwrap_or_default()
    }

    /// Findings whose issue or details contain `term`, ignoring case.
    pub fn search_findings(&self, term: &str) -> Vec<Finding> {
        let term = term.to_lowercase();
        self.findings()
            .into_iter()
            .filter(|f| {
                f.issue.to_lowercase().contains(&term) || f.details.to_lowercase().contains(&term)
            })
            .collect()
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.typed(SectionKind::Recommendations).unwrap_or_default()
    }

    pub fn detailed_results(&self) -> Option<DetailedResults> {
        self.typed(SectionKind::DetailedResults)
    }

    /// Metadata entries in service order. Non-object metadata yields nothing.
    pub fn metadata(&self) -> Vec<MetadataEntry> {
        let Some(Value::Object(map)) = self.section(SectionKind::Metadata).map(|s| &s.content)
        else {
            return Vec::new();
        };

        map.iter()
            .map(|(key, value)| MetadataEntry {
                key: key.clone(),
                label: metadata_label(key),
                value: classify_metadata(value),
            })
            .collect()
    }

    pub fn images(&self) -> Vec<ReportImage> {
        self.raw
            .get(IMAGES_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    fn typed<T: DeserializeOwned>(&self, kind: SectionKind) -> Option<T> {
        let section = self.section(kind)?;
        match serde_json::from_value(section.content.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(section = %kind, error = %e, "Section does not match its typed view");
                None
            }
        }
    }
}

/// Sections that are `null`, `false`, zero or an empty string are not shown.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A metadata value is treated as a timestamp iff it is a string containing
/// `T`. This is a loose heuristic and matches ordinary words too.
pub fn is_timestamp_like(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.contains('T'))
}

fn classify_metadata(value: &Value) -> MetadataValue {
    match value {
        Value::String(s) if is_timestamp_like(value) => MetadataValue::Timestamp(s.clone()),
        Value::String(s) => MetadataValue::Text(s.clone()),
        other => MetadataValue::Other(other.clone()),
    }
}

/// `creation_date` becomes `Creation Date`.
pub fn metadata_label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut label = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        if at_word_start && c.is_alphanumeric() {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    label
}

/// Render a timestamp-like metadata value for display. Values that do not
/// parse are shown unchanged.
pub fn display_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M:%S %:z").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    raw.to_string()
}
