//! Core data models used throughout the standards catalog.
//!
//! These types represent the raw sheets handed over by the workbook reader
//! and the canonical records that flow through normalization, deduplication,
//! and search.

use serde::{Deserialize, Serialize};

/// One worksheet as delivered by the ingestion layer.
///
/// Column names are already trimmed and de-duplicated (`Name`, `Name.1`, ...).
/// Every cell is text: blank cells are the empty string. A row may stop
/// before the last column; cells past its end read as empty. A row never
/// has more cells than there are columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }
}

/// A sheet the workbook reader could not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sheet '{sheet}' could not be read: {message}")]
pub struct SheetReadError {
    pub sheet: String,
    pub message: String,
}

/// One entry per worksheet, in workbook order.
pub type SheetEntry = Result<RawSheet, SheetReadError>;

/// Named fields of a [`CanonicalRecord`].
///
/// Used by the fallback-chain table in [`crate::normalize`] and by the
/// text search field list in [`crate::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Section,
    Source,
    Description,
    Keywords,
    ControlId,
    Title,
    PageNumber,
    RequirementText,
    SimplifiedSummary,
    ControlCategory,
}

impl Field {
    /// The field name as it appears in JSON output.
    pub fn json_name(self) -> &'static str {
        match self {
            Field::Section => "Section",
            Field::Source => "Source",
            Field::Description => "Description",
            Field::Keywords => "Keywords",
            Field::ControlId => "ControlID",
            Field::Title => "Title",
            Field::PageNumber => "Page Number",
            Field::RequirementText => "Requirement Text",
            Field::SimplifiedSummary => "Simplified Summary",
            Field::ControlCategory => "Control Category",
        }
    }
}

/// One normalized control/requirement entry.
///
/// Serialized with the exact column names the web front end expects,
/// including the spaces in `Page Number` and friends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(rename = "Section")]
    pub section: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Keywords")]
    pub keywords: String,
    #[serde(rename = "ControlID")]
    pub control_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Page Number")]
    pub page_number: String,
    #[serde(rename = "Requirement Text")]
    pub requirement_text: String,
    #[serde(rename = "Simplified Summary")]
    pub simplified_summary: String,
    #[serde(rename = "Control Category")]
    pub control_category: String,
}

/// Identity of a record for deduplication.
///
/// Section, Keywords, Page Number and Control Category are not part of the
/// key: records that differ only there collapse into the first one seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey<'a> {
    pub source: &'a str,
    pub control_id: &'a str,
    pub requirement_text: &'a str,
    pub simplified_summary: &'a str,
    pub title: &'a str,
}

impl CanonicalRecord {
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Section => &self.section,
            Field::Source => &self.source,
            Field::Description => &self.description,
            Field::Keywords => &self.keywords,
            Field::ControlId => &self.control_id,
            Field::Title => &self.title,
            Field::PageNumber => &self.page_number,
            Field::RequirementText => &self.requirement_text,
            Field::SimplifiedSummary => &self.simplified_summary,
            Field::ControlCategory => &self.control_category,
        }
    }

    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Section => &mut self.section,
            Field::Source => &mut self.source,
            Field::Description => &mut self.description,
            Field::Keywords => &mut self.keywords,
            Field::ControlId => &mut self.control_id,
            Field::Title => &mut self.title,
            Field::PageNumber => &mut self.page_number,
            Field::RequirementText => &mut self.requirement_text,
            Field::SimplifiedSummary => &mut self.simplified_summary,
            Field::ControlCategory => &mut self.control_category,
        }
    }

    pub fn dedup_key(&self) -> DedupKey<'_> {
        DedupKey {
            source: &self.source,
            control_id: &self.control_id,
            requirement_text: &self.requirement_text,
            simplified_summary: &self.simplified_summary,
            title: &self.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_front_end_field_names() {
        let record = CanonicalRecord {
            section: "4.1".into(),
            page_number: "12".into(),
            control_category: "Access".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Section"], "4.1");
        assert_eq!(json["Page Number"], "12");
        assert_eq!(json["Control Category"], "Access");
        assert_eq!(json.as_object().unwrap().len(), 10);
    }

    #[test]
    fn field_accessors_agree_with_json_names() {
        let mut record = CanonicalRecord::default();
        *record.field_mut(Field::ControlId) = "AC-1".into();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json[Field::ControlId.json_name()], "AC-1");
        assert_eq!(record.field(Field::ControlId), "AC-1");
    }

    #[test]
    fn dedup_key_ignores_keywords_and_section() {
        let a = CanonicalRecord {
            source: "NIST".into(),
            control_id: "AC-1".into(),
            section: "1".into(),
            keywords: "a".into(),
            ..Default::default()
        };
        let b = CanonicalRecord {
            section: "2".into(),
            keywords: "b".into(),
            ..a.clone()
        };
        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}
