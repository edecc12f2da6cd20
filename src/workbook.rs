//! OOXML workbook reading (`.xlsx`, `.xltx`, `.xlsm`).
//!
//! Turns a workbook into one [`SheetEntry`] per worksheet, in workbook order.
//! All cleanup the normalizer relies on happens here:
//!
//! - the header row is the first non-blank row; header names are trimmed,
//!   `_x000D_` markers removed, blanks named `Unnamed: {i}`, and repeated
//!   names suffixed `.1`, `.2`, ... in order of appearance;
//! - every cell becomes text: shared/inline strings as-is, numbers without a
//!   trailing `.0` when integral, booleans as `True`/`False`;
//! - spreadsheet "not available" markers (`#N/A`, `NULL`, `nan`, ...) and
//!   missing cells become the empty string, `_x000D_` is stripped, and every
//!   value is trimmed;
//! - fully blank data rows are skipped, and each data row ends at its last
//!   non-empty cell; the header spans every column any row uses.
//!
//! A worksheet whose XML cannot be parsed is returned as a [`SheetReadError`]
//! so the caller can skip just that sheet. Failing to open the archive or
//! its workbook part is a [`WorkbookError`].

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};

use crate::models::{RawSheet, SheetEntry, SheetReadError};

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 64 * 1024 * 1024;
/// Maximum non-empty cells kept per sheet.
const MAX_CELLS_PER_SHEET: usize = 2_000_000;
/// Maximum cells laid out per sheet, counting blanks before each row's last value.
const MAX_CELL_SLOTS_PER_SHEET: usize = 4_000_000;
/// Excel's column limit (`XFD`).
const MAX_COLUMNS: usize = 16_384;

/// Carriage-return artifact left in text exported from some editors.
const CR_MARKER: &str = "_x000D_";

/// Cell texts read as "no value".
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("failed to read workbook {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a readable workbook archive: {0}")]
    Archive(String),
    #[error("workbook part {0} is missing")]
    MissingPart(String),
    #[error("malformed XML in {part}: {message}")]
    Xml { part: String, message: String },
}

/// Reads every worksheet of the workbook at `path`.
pub fn read_workbook(path: &Path) -> Result<Vec<SheetEntry>, WorkbookError> {
    let bytes = std::fs::read(path).map_err(|source| WorkbookError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_workbook_bytes(&bytes)
}

/// Reads every worksheet of an in-memory workbook.
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<Vec<SheetEntry>, WorkbookError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| WorkbookError::Archive(e.to_string()))?;

    let workbook_xml = read_part(&mut archive, "xl/workbook.xml")?
        .ok_or_else(|| WorkbookError::MissingPart("xl/workbook.xml".to_string()))?;
    let sheets = parse_sheet_list(&workbook_xml).map_err(|message| WorkbookError::Xml {
        part: "xl/workbook.xml".to_string(),
        message,
    })?;

    let rels = match read_part(&mut archive, "xl/_rels/workbook.xml.rels")? {
        Some(xml) => parse_relationships(&xml).map_err(|message| WorkbookError::Xml {
            part: "xl/_rels/workbook.xml.rels".to_string(),
            message,
        })?,
        None => HashMap::new(),
    };

    let shared_strings = match read_part(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml).map_err(|message| WorkbookError::Xml {
            part: "xl/sharedStrings.xml".to_string(),
            message,
        })?,
        None => Vec::new(),
    };

    let mut entries = Vec::with_capacity(sheets.len());
    for (idx, sheet) in sheets.into_iter().enumerate() {
        let part = sheet
            .rel_id
            .as_deref()
            .and_then(|id| rels.get(id))
            .map(|target| resolve_target(target))
            .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", idx + 1));
        entries.push(read_sheet(&mut archive, sheet.name, &part, &shared_strings));
    }
    Ok(entries)
}

fn read_sheet(
    archive: &mut Archive<'_>,
    name: String,
    part: &str,
    shared_strings: &[String],
) -> SheetEntry {
    let fail = |name: String, message: String| SheetReadError {
        sheet: name,
        message,
    };
    let xml = match read_part(archive, part) {
        Ok(Some(xml)) => xml,
        Ok(None) => return Err(fail(name, format!("worksheet part {} is missing", part))),
        Err(e) => return Err(fail(name, e.to_string())),
    };
    match parse_sheet_cells(&xml, shared_strings) {
        Ok(cells) => table_from_cells(name.clone(), cells).map_err(|message| fail(name, message)),
        Err(message) => Err(fail(name, message)),
    }
}

/// Reads a ZIP entry, bounded by [`MAX_XML_ENTRY_BYTES`]. `Ok(None)` when absent.
fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<Option<Vec<u8>>, WorkbookError> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(WorkbookError::Archive(e.to_string())),
    };
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| WorkbookError::Archive(e.to_string()))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(WorkbookError::Archive(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, MAX_XML_ENTRY_BYTES
        )));
    }
    Ok(Some(out))
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn attr(e: &BytesStart<'_>, local_name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local_name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn xml_error(reader: &quick_xml::Reader<&[u8]>, e: quick_xml::Error) -> String {
    format!("{} at byte {}", e, reader.buffer_position())
}

struct SheetRef {
    name: String,
    rel_id: Option<String>,
}

fn parse_sheet_list(xml: &[u8]) -> Result<Vec<SheetRef>, String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                let name = attr(&e, b"name").unwrap_or_default();
                sheets.push(SheetRef {
                    name,
                    rel_id: attr(&e, b"id"),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>, String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut rels = HashMap::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr(&e, b"Id"), attr(&e, b"Target")) {
                    rels.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Shared strings, one per `<si>`, with rich-text runs concatenated and
/// phonetic (`<rPh>`) runs left out.
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    let mut in_phonetic = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_t = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Text(te)) if in_t && !in_phonetic => {
                let text = te.unescape().map_err(|e| xml_error(&reader, e))?;
                current.push_str(&text);
            }
            Ok(Event::CData(cd)) if in_t && !in_phonetic => {
                current.push_str(&String::from_utf8_lossy(&cd));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_t = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Value type declared by a cell's `t` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Number,
    SharedString,
    InlineString,
    FormulaString,
    Boolean,
    Error,
}

impl CellKind {
    fn from_attr(t: Option<&str>) -> Self {
        match t {
            Some("s") => CellKind::SharedString,
            Some("inlineStr") => CellKind::InlineString,
            Some("str") => CellKind::FormulaString,
            Some("b") => CellKind::Boolean,
            Some("e") => CellKind::Error,
            _ => CellKind::Number,
        }
    }
}

/// Splits an `A1`-style reference into zero-based (row, column).
fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let letters_end = reference
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(reference.len());
    let (letters, digits) = reference.split_at(letters_end);
    if letters.is_empty() {
        return None;
    }
    let mut col = 0usize;
    for c in letters.bytes() {
        col = col * 26 + usize::from(c.to_ascii_uppercase() - b'A' + 1);
        if col > MAX_COLUMNS {
            return None;
        }
    }
    let row = digits.parse::<usize>().ok()?.checked_sub(1)?;
    Some((row, col - 1))
}

/// Renders a numeric cell the way it reads in the sheet: `4` not `4.0`.
fn format_number(raw: &str) -> String {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
            format!("{}", v as i64)
        }
        Ok(v) if v.is_finite() => format!("{}", v),
        _ => raw.to_string(),
    }
}

/// Strips `_x000D_` and surrounding whitespace.
fn clean_text(raw: &str) -> String {
    if raw.contains(CR_MARKER) {
        raw.replace(CR_MARKER, "").trim().to_string()
    } else {
        raw.trim().to_string()
    }
}

fn coerce_cell(kind: CellKind, raw: &str, shared_strings: &[String]) -> Result<String, String> {
    let text = match kind {
        CellKind::SharedString => {
            let idx: usize = raw
                .trim()
                .parse()
                .map_err(|_| format!("invalid shared string index '{}'", raw))?;
            shared_strings
                .get(idx)
                .cloned()
                .ok_or_else(|| format!("shared string index {} out of range", idx))?
        }
        CellKind::InlineString | CellKind::FormulaString | CellKind::Error => raw.to_string(),
        CellKind::Boolean => match raw.trim() {
            "1" => "True".to_string(),
            "0" => "False".to_string(),
            other => other.to_string(),
        },
        CellKind::Number => format_number(raw),
    };
    if NA_MARKERS.contains(&text.as_str()) {
        return Ok(String::new());
    }
    Ok(clean_text(&text))
}

/// Non-empty cells of one sheet keyed by zero-based row, then column.
type CellGrid = BTreeMap<usize, BTreeMap<usize, String>>;

fn parse_sheet_cells(xml: &[u8], shared_strings: &[String]) -> Result<CellGrid, String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut grid = CellGrid::new();
    let mut cell_count = 0usize;

    let mut next_row = 0usize;
    let mut row = 0usize;
    let mut next_col = 0usize;
    let mut cell: Option<(usize, CellKind)> = None;
    let mut value = String::new();
    let mut in_value = false;
    let mut in_inline = false;
    let mut in_inline_text = false;
    let mut in_phonetic = false;

    let locate = |e: &BytesStart<'_>, next_col: usize| {
        match attr(e, b"r") {
            Some(r) => parse_cell_ref(&r)
                .map(|(row, col)| (Some(row), col))
                .ok_or_else(|| format!("invalid cell reference '{}'", r)),
            None => Ok((None, next_col)),
        }
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_number(&e, next_row)?;
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let (r, col) = locate(&e, next_col)?;
                    if let Some(r) = r {
                        row = r;
                    }
                    next_col = col + 1;
                    let kind = CellKind::from_attr(attr(&e, b"t").as_deref());
                    cell = Some((col, kind));
                    value.clear();
                }
                b"v" => in_value = true,
                b"is" => in_inline = true,
                b"t" if in_inline => in_inline_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_number(&e, next_row)?;
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let (_, col) = locate(&e, next_col)?;
                    next_col = col + 1;
                }
                _ => {}
            },
            Ok(Event::Text(te)) if in_value || (in_inline_text && !in_phonetic) => {
                let text = te.unescape().map_err(|e| xml_error(&reader, e))?;
                value.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some((col, kind)) = cell.take() {
                        let text = coerce_cell(kind, &value, shared_strings)?;
                        if !text.is_empty() {
                            cell_count += 1;
                            if cell_count > MAX_CELLS_PER_SHEET {
                                return Err(format!(
                                    "sheet exceeds {} non-empty cells",
                                    MAX_CELLS_PER_SHEET
                                ));
                            }
                            grid.entry(row).or_default().insert(col, text);
                        }
                    }
                    in_value = false;
                    in_inline = false;
                }
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"is" => in_inline = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(grid)
}

fn row_number(e: &BytesStart<'_>, next_row: usize) -> Result<usize, String> {
    match attr(e, b"r") {
        Some(r) => r
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| format!("invalid row number '{}'", r)),
        None => Ok(next_row),
    }
}

/// Names header cells: cleaned text, `Unnamed: {i}` for blanks, and `.N`
/// suffixes for repeats.
pub fn header_names(raw: Vec<String>) -> Vec<String> {
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(raw.len());

    for (i, cell) in raw.into_iter().enumerate() {
        let base = clean_text(&cell);
        let base = if base.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            base
        };

        let mut name = base.clone();
        if let Some(&count) = used.get(&base) {
            let mut n = count;
            while used.contains_key(&name) {
                name = format!("{}.{}", base, n);
                n += 1;
            }
            used.insert(base, n);
        }
        used.insert(name.clone(), 1);
        names.push(name);
    }
    names
}

/// Lays the grid out as a header plus data rows.
///
/// Data rows stop at their last non-empty cell; readers treat cells past
/// the end of a row as empty. The blanks padded in before each row's last
/// value count against [`MAX_CELL_SLOTS_PER_SHEET`].
fn table_from_cells(name: String, grid: CellGrid) -> Result<RawSheet, String> {
    let mut rows = grid.into_values();
    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(RawSheet::new(name, Vec::new(), Vec::new())),
    };
    let rows: Vec<BTreeMap<usize, String>> = rows.collect();

    let row_len = |cells: &BTreeMap<usize, String>| cells.keys().next_back().map_or(0, |&c| c + 1);

    let slots = rows
        .iter()
        .map(row_len)
        .try_fold(0usize, |total, len| total.checked_add(len))
        .filter(|&total| total <= MAX_CELL_SLOTS_PER_SHEET)
        .ok_or_else(|| {
            format!(
                "sheet spans more than {} cells once rows are laid out",
                MAX_CELL_SLOTS_PER_SHEET
            )
        })?;

    let width = std::iter::once(&header)
        .chain(rows.iter())
        .map(row_len)
        .max()
        .unwrap_or(0);

    let mut header_cells = vec![String::new(); width];
    for (col, text) in header {
        header_cells[col] = text;
    }

    let mut table = Vec::with_capacity(rows.len());
    for cells in rows {
        let mut out = vec![String::new(); row_len(&cells)];
        for (col, text) in cells {
            out[col] = text;
        }
        table.push(out);
    }
    tracing::trace!(sheet = %name, width, slots, "laid out sheet");

    Ok(RawSheet::new(name, header_names(header_cells), table))
}
