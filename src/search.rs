//! Keyword and filter search over the standards catalog.
//!
//! Search is an unordered containment filter, not a ranking: a record
//! matches when any searchable field contains the query text
//! (case-insensitive), and the Section / Source filters then require exact
//! equality. Results keep store order.
//!
//! Also hosts the `stdcat search` and `stdcat filters` commands.

use anyhow::Result;
use serde::Deserialize;

use crate::config::Config;
use crate::dataset::load_dataset;
use crate::models::{CanonicalRecord, Field};

/// Section filter value meaning "no section filter".
pub const ALL_SECTIONS: &str = "All Sections";
/// Source filter value meaning "no source filter".
pub const ALL_SOURCES: &str = "All Sources";

/// Fields scanned for the text query.
pub const SEARCH_FIELDS: &[Field] = &[
    Field::Description,
    Field::Keywords,
    Field::ControlId,
    Field::Title,
    Field::RequirementText,
    Field::SimplifiedSummary,
    Field::ControlCategory,
    Field::Section,
];

/// Query parameters of `GET /api/standards`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StandardsQuery {
    pub query: String,
    pub section: String,
    pub source: String,
}

impl StandardsQuery {
    pub fn new(
        query: impl Into<String>,
        section: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            section: section.into(),
            source: source.into(),
        }
    }

    /// Prepares the query for matching many records.
    pub fn matcher(&self) -> QueryMatcher<'_> {
        QueryMatcher {
            needle: self.query.trim().to_lowercase(),
            section: active_filter(&self.section, ALL_SECTIONS),
            source: active_filter(&self.source, ALL_SOURCES),
        }
    }
}

fn active_filter<'a>(value: &'a str, sentinel: &str) -> Option<&'a str> {
    if value.is_empty() || value == sentinel {
        None
    } else {
        Some(value)
    }
}

/// A [`StandardsQuery`] with its text lowercased and filters resolved.
#[derive(Debug, Clone)]
pub struct QueryMatcher<'q> {
    needle: String,
    section: Option<&'q str>,
    source: Option<&'q str>,
}

impl QueryMatcher<'_> {
    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        self.matches_text(record)
            && self.section.is_none_or(|s| record.section == s)
            && self.source.is_none_or(|s| record.source == s)
    }

    fn matches_text(&self, record: &CanonicalRecord) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        SEARCH_FIELDS
            .iter()
            .any(|&field| record.field(field).to_lowercase().contains(&self.needle))
    }
}

/// Runs a one-shot search against the configured workbook and prints the results.
pub fn run_search(
    config: &Config,
    query: &StandardsQuery,
    json: bool,
) -> Result<()> {
    let dataset = load_dataset(&config.workbook.path);
    let results = dataset.store.search(query);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, record) in results.iter().enumerate() {
        println!(
            "{}. [{}] {} (section: {}, source: {})",
            i + 1,
            record.control_id,
            if record.title.is_empty() {
                "<untitled>"
            } else {
                record.title.as_str()
            },
            if record.section.is_empty() {
                "-"
            } else {
                record.section.as_str()
            },
            record.source,
        );
        if !record.description.is_empty() {
            println!("    {}", truncate(&record.description, 160));
        }
        println!();
    }
    println!("{} result(s)", results.len());

    Ok(())
}

/// Prints the section and source filter vocabularies.
pub fn run_filters(config: &Config, json: bool) -> Result<()> {
    let dataset = load_dataset(&config.workbook.path);
    let store = &dataset.store;

    if json {
        let body = serde_json::json!({
            "sections": store.sections(),
            "sources": store.sources(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Sections ({}):", store.sections().len());
    for section in store.sections() {
        println!("  {}", section);
    }
    println!("Sources ({}):", store.sources().len());
    for source in store.sources() {
        println!("  {}", source);
    }
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StandardsStore;

    fn store() -> StandardsStore {
        let records = vec![
            CanonicalRecord {
                section: "4.1".into(),
                source: "NIST".into(),
                description: "Control access to systems".into(),
                keywords: "authentication, roles".into(),
                control_id: "AC-1".into(),
                title: "Access Policy".into(),
                ..Default::default()
            },
            CanonicalRecord {
                section: "4.2".into(),
                source: "ISO/IEC".into(),
                description: "Incident response plan".into(),
                control_id: "IR-1".into(),
                control_category: "Incident Response".into(),
                ..Default::default()
            },
            CanonicalRecord {
                section: "4.1".into(),
                source: "ISO/IEC".into(),
                simplified_summary: "Use MFA for AUTHENTICATION".into(),
                control_id: "ISO-AC-2".into(),
                page_number: "zeta-42".into(),
                ..Default::default()
            },
        ];
        StandardsStore::new(
            records,
            vec!["4.1".into(), "4.2".into()],
            vec!["ISO/IEC".into(), "NIST".into()],
        )
    }

    fn ids(results: &[&CanonicalRecord]) -> Vec<String> {
        results.iter().map(|r| r.control_id.clone()).collect()
    }

    #[test]
    fn empty_query_matches_everything() {
        let s = store();
        assert_eq!(s.search(&StandardsQuery::default()).len(), 3);
        assert_eq!(s.search(&StandardsQuery::new("   ", "", "")).len(), 3);
    }

    #[test]
    fn text_match_is_case_insensitive_across_fields() {
        let s = store();
        let hits = s.search(&StandardsQuery::new("Authentication", "", ""));
        assert_eq!(ids(&hits), vec!["AC-1", "ISO-AC-2"]);
    }

    #[test]
    fn page_number_and_source_are_not_searched() {
        let s = store();
        assert!(s.search(&StandardsQuery::new("nist", "", "")).is_empty());
        assert!(s.search(&StandardsQuery::new("zeta", "", "")).is_empty());
    }

    #[test]
    fn control_category_and_section_are_searched() {
        let s = store();
        assert_eq!(
            ids(&s.search(&StandardsQuery::new("incident response", "", ""))),
            vec!["IR-1"]
        );
        assert_eq!(
            ids(&s.search(&StandardsQuery::new("4.2", "", ""))),
            vec!["IR-1"]
        );
    }

    #[test]
    fn section_and_source_filters_are_exact() {
        let s = store();
        assert_eq!(
            ids(&s.search(&StandardsQuery::new("", "4.1", ""))),
            vec!["AC-1", "ISO-AC-2"]
        );
        assert_eq!(
            ids(&s.search(&StandardsQuery::new("", "4.1", "ISO/IEC"))),
            vec!["ISO-AC-2"]
        );
        assert!(s.search(&StandardsQuery::new("", "4", "")).is_empty());
        assert!(s.search(&StandardsQuery::new("", "", "iso/iec")).is_empty());
    }

    #[test]
    fn sentinels_disable_filters() {
        let s = store();
        let hits = s.search(&StandardsQuery::new("", ALL_SECTIONS, ALL_SOURCES));
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn text_and_filters_intersect() {
        let s = store();
        let hits = s.search(&StandardsQuery::new("access", "4.1", "NIST"));
        assert_eq!(ids(&hits), vec!["AC-1"]);
        assert!(s
            .search(&StandardsQuery::new("incident", "4.1", ""))
            .is_empty());
    }

    #[test]
    fn query_is_a_literal_substring() {
        let s = store();
        assert!(s.search(&StandardsQuery::new("a.c", "", "")).is_empty());
        assert!(s.search(&StandardsQuery::new("(", "", "")).is_empty());
    }

    #[test]
    fn truncate_flattens_and_shortens() {
        assert_eq!(truncate("a\n b", 10), "a b");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }
}
