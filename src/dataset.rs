//! Dataset building: every sheet of a workbook into one [`StandardsStore`].
//!
//! Sheets are normalized in workbook order. Their records are concatenated,
//! deduplicated on [`CanonicalRecord::dedup_key`] (first seen wins), and the
//! raw Section and Source values are turned into sorted filter vocabularies.
//!
//! A sheet that cannot be read or normalized is logged and left out while
//! the remaining sheets load normally. A workbook that cannot be opened is
//! an error from [`try_load_dataset`] and an empty store from [`load_dataset`].

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::models::{CanonicalRecord, SheetEntry};
use crate::natsort::sort_natural;
use crate::normalize::{is_example_sheet, normalize_sheet, SheetOutcome, SkipReason};
use crate::store::StandardsStore;
use crate::workbook::{self, WorkbookError};

/// What happened to one sheet during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetStatus {
    Loaded { kept: usize, dropped: usize },
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReport {
    pub sheet: String,
    pub status: SheetStatus,
}

/// A built store together with the per-sheet ingestion report.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub store: StandardsStore,
    pub reports: Vec<SheetReport>,
}

/// True when `section` consists solely of ASCII digits and dots (at least one character).
pub fn is_numeric_section(section: &str) -> bool {
    !section.is_empty() && section.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

/// Removes records whose dedup key was already seen, keeping first-seen order.
pub fn dedup_records(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(records.len());
        records.iter().map(|r| seen.insert(r.dedup_key())).collect()
    };
    records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect()
}

/// Builds a dataset from sheets already read into memory.
pub fn build_dataset(sheets: &[SheetEntry]) -> Dataset {
    let mut records = Vec::new();
    let mut raw_sections = BTreeSet::new();
    let mut sources = BTreeSet::new();
    let mut reports = Vec::with_capacity(sheets.len());

    for entry in sheets {
        let sheet = match entry {
            Ok(sheet) => sheet,
            Err(e) if is_example_sheet(&e.sheet) => {
                info!(sheet = %e.sheet, "skipping example sheet");
                reports.push(SheetReport {
                    sheet: e.sheet.clone(),
                    status: SheetStatus::Skipped(SkipReason::ExampleSheet),
                });
                continue;
            }
            Err(e) => {
                error!(sheet = %e.sheet, error = %e.message, "failed to read sheet, skipping");
                reports.push(SheetReport {
                    sheet: e.sheet.clone(),
                    status: SheetStatus::Failed(e.message.clone()),
                });
                continue;
            }
        };

        let status = match normalize_sheet(sheet) {
            Ok(SheetOutcome::Skipped(reason)) => {
                match reason {
                    SkipReason::ExampleSheet => info!(sheet = %sheet.name, "skipping example sheet"),
                    SkipReason::NoRows => warn!(sheet = %sheet.name, "sheet is empty, skipping"),
                }
                SheetStatus::Skipped(reason)
            }
            Ok(SheetOutcome::Normalized(out)) => {
                debug!(
                    sheet = %sheet.name,
                    columns = ?sheet.columns,
                    kept = out.records.len(),
                    dropped = out.dropped,
                    "normalized sheet"
                );
                let status = SheetStatus::Loaded {
                    kept: out.records.len(),
                    dropped: out.dropped,
                };
                records.extend(out.records);
                raw_sections.extend(out.sections);
                sources.extend(out.sources);
                status
            }
            Err(e) => {
                error!(
                    sheet = %sheet.name,
                    columns = ?sheet.columns,
                    error = %e,
                    "failed to normalize sheet, skipping"
                );
                SheetStatus::Failed(e.to_string())
            }
        };
        reports.push(SheetReport {
            sheet: sheet.name.clone(),
            status,
        });
    }

    let mut sections: Vec<String> = raw_sections
        .into_iter()
        .filter(|section| {
            let keep = is_numeric_section(section);
            if !keep {
                debug!(section = %section, "filtering out non-numeric section");
            }
            keep
        })
        .collect();
    sort_natural(&mut sections);

    // BTreeSet iteration is already byte-wise ascending.
    let sources: Vec<String> = sources.into_iter().collect();

    let total = records.len();
    let records = dedup_records(records);
    info!(
        records = records.len(),
        duplicates = total - records.len(),
        sections = sections.len(),
        sources = sources.len(),
        "standards dataset built"
    );

    Dataset {
        store: StandardsStore::new(records, sections, sources),
        reports,
    }
}

/// Reads the workbook at `path` and builds a dataset from it.
///
/// Only a workbook that cannot be opened at all is an error; unreadable
/// sheets are reported in [`Dataset::reports`].
pub fn try_load_dataset(path: &Path) -> Result<Dataset, WorkbookError> {
    info!(path = %path.display(), "loading standards workbook");
    let sheets = workbook::read_workbook(path)?;
    let names: Vec<&str> = sheets
        .iter()
        .map(|s| match s {
            Ok(sheet) => sheet.name.as_str(),
            Err(e) => e.sheet.as_str(),
        })
        .collect();
    info!(sheets = ?names, "discovered sheets");
    Ok(build_dataset(&sheets))
}

/// Like [`try_load_dataset`], but a workbook that is missing or cannot be
/// opened produces an empty dataset.
pub fn load_dataset(path: &Path) -> Dataset {
    try_load_dataset(path).unwrap_or_else(|e| {
        error!(
            path = %path.display(),
            error = %e,
            "failed to load standards workbook; serving an empty catalog"
        );
        Dataset::default()
    })
}
