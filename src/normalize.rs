//! Sheet normalization: one raw worksheet in, canonical records out.
//!
//! Every canonical field except `Source` is resolved through a declared
//! fallback chain ([`FIELD_RULES`]): the first column in the chain holding a
//! usable value wins, otherwise the rule's default applies. A value is
//! usable when it is neither empty nor the literal `nan` (any case) after
//! trimming. Columns a sheet does not have simply count as empty.
//!
//! `Source` comes from the sheet name, with one fixed rename
//! ([`source_label`]).

use std::collections::{BTreeSet, HashMap};

use crate::models::{CanonicalRecord, Field, RawSheet};

/// Sheet name (trimmed, case-insensitive) that holds sample data only.
pub const EXAMPLE_SHEET: &str = "example";

/// Fallback chain for one canonical field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    /// Column names tried in order.
    pub chain: &'static [&'static str],
    /// Value used when no column in the chain is usable.
    pub default: &'static str,
}

pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::Section,
        chain: &["Sub-Section", "Section", "Control Category"],
        default: "",
    },
    FieldRule {
        field: Field::Description,
        chain: &["Requirement Text", "Simplified Summary"],
        default: "",
    },
    FieldRule {
        field: Field::Keywords,
        chain: &["Keywords"],
        default: "",
    },
    FieldRule {
        field: Field::ControlId,
        chain: &["ControlID", "Internal Control ID"],
        default: "N/A",
    },
    FieldRule {
        field: Field::Title,
        chain: &["Title"],
        default: "",
    },
    FieldRule {
        field: Field::PageNumber,
        chain: &["Page Number"],
        default: "",
    },
    FieldRule {
        field: Field::RequirementText,
        chain: &["Requirement Text", "Requirement Text.1"],
        default: "",
    },
    FieldRule {
        field: Field::SimplifiedSummary,
        chain: &["Simplified Summary", "Simplified Summary.1"],
        default: "",
    },
    FieldRule {
        field: Field::ControlCategory,
        chain: &["Control Category"],
        default: "",
    },
];

/// Sheet names that map to a different source label.
const SOURCE_RENAMES: &[(&str, &str)] = &[("IEC 62433-3", "IEC 62443-3-3")];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("row {row} has {found} cells but the sheet only has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Why a sheet contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ExampleSheet,
    NoRows,
}

/// Records and raw vocabulary values produced by one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedSheet {
    pub records: Vec<CanonicalRecord>,
    pub sections: BTreeSet<String>,
    pub sources: BTreeSet<String>,
    /// Rows dropped because both Section and Description were empty.
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOutcome {
    Skipped(SkipReason),
    Normalized(NormalizedSheet),
}

/// Returns the usable form of a cell: trimmed, with empty and `nan` treated as absent.
pub fn clean_value(raw: &str) -> Option<&str> {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(value)
    }
}

pub fn is_example_sheet(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(EXAMPLE_SHEET)
}

/// Maps a sheet name to its source label.
pub fn source_label(sheet_name: &str) -> String {
    let name = sheet_name.trim();
    SOURCE_RENAMES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Column-name lookup for one sheet. The first column with a given name wins.
pub struct ColumnIndex<'a> {
    positions: HashMap<&'a str, usize>,
}

impl<'a> ColumnIndex<'a> {
    pub fn new(columns: &'a [String]) -> Self {
        let mut positions = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            positions.entry(name.as_str()).or_insert(i);
        }
        Self { positions }
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }
}

/// A row viewed through its sheet's column index.
pub struct Row<'a> {
    columns: &'a ColumnIndex<'a>,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    pub fn new(columns: &'a ColumnIndex<'a>, cells: &'a [String]) -> Self {
        Self { columns, cells }
    }

    /// The usable value of `column`, or `None` when absent, empty, or `nan`.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.columns.position(column)?;
        self.cells.get(idx).and_then(|cell| clean_value(cell))
    }

    fn resolve(&self, rule: &FieldRule) -> &'a str {
        rule.chain
            .iter()
            .find_map(|column| self.get(column))
            .unwrap_or(rule.default)
    }
}

/// Resolves every canonical field of one row.
pub fn resolve_record(row: &Row<'_>, source: &str) -> CanonicalRecord {
    let mut record = CanonicalRecord {
        source: source.to_string(),
        ..Default::default()
    };
    for rule in FIELD_RULES {
        *record.field_mut(rule.field) = row.resolve(rule).to_string();
    }
    record
}

/// Normalizes one sheet.
///
/// Rows whose Section and Description both resolve to empty are dropped.
/// A row with more cells than the sheet has column names is an error for
/// the whole sheet. The workbook reader never produces one, since its header
/// spans every column any row uses; sheets built by other callers may.
pub fn normalize_sheet(sheet: &RawSheet) -> Result<SheetOutcome, NormalizeError> {
    if is_example_sheet(&sheet.name) {
        return Ok(SheetOutcome::Skipped(SkipReason::ExampleSheet));
    }
    if sheet.rows.is_empty() {
        return Ok(SheetOutcome::Skipped(SkipReason::NoRows));
    }

    let expected = sheet.columns.len();
    if let Some((row, cells)) = sheet
        .rows
        .iter()
        .enumerate()
        .find(|(_, cells)| cells.len() > expected)
    {
        return Err(NormalizeError::RaggedRow {
            row,
            expected,
            found: cells.len(),
        });
    }

    let source = source_label(&sheet.name);
    let columns = ColumnIndex::new(&sheet.columns);
    let mut out = NormalizedSheet::default();

    for cells in &sheet.rows {
        let record = resolve_record(&Row::new(&columns, cells), &source);
        if record.section.is_empty() && record.description.is_empty() {
            out.dropped += 1;
            continue;
        }
        if !record.section.is_empty() {
            out.sections.insert(record.section.clone());
        }
        if !record.source.is_empty() {
            out.sources.insert(record.source.clone());
        }
        out.records.push(record);
    }

    Ok(SheetOutcome::Normalized(out))
}
