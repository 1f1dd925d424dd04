// Workbook decoding (xlsx, xlsm, xlsb, xls, ods) and export (xlsx only)
//
// Decoding reads one sheet: the named one, else the first. Row 1 is the
// header row; every later non-blank row becomes a RawRow.

use std::borrow::Cow;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use newsmerge_core::{DecodeFailure, MergedEntry, RawRow};

use crate::export::{export_record, EXPORT_HEADERS};
use crate::rows::assemble;

/// Decode one sheet of a workbook on disk.
pub fn read_rows(path: &Path, sheet: Option<&str>) -> Result<Vec<RawRow>, DecodeFailure> {
    let workbook = open_workbook_auto(path).map_err(open_failure)?;
    rows_from_workbook(workbook, sheet)
}

/// Decode one sheet of an in-memory workbook. The format is detected from the bytes.
pub fn read_rows_from_bytes(bytes: Vec<u8>, sheet: Option<&str>) -> Result<Vec<RawRow>, DecodeFailure> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(open_failure)?;
    rows_from_workbook(workbook, sheet)
}

fn open_failure(err: calamine::Error) -> DecodeFailure {
    match err {
        calamine::Error::Io(e) => DecodeFailure::Unreadable(e.to_string()),
        other => DecodeFailure::Corrupt(format!("Failed to open workbook: {other}")),
    }
}

fn rows_from_workbook<RS: Read + Seek>(
    mut workbook: Sheets<RS>,
    sheet: Option<&str>,
) -> Result<Vec<RawRow>, DecodeFailure> {
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| DecodeFailure::MissingSheet(wanted.to_string()))?,
        None => sheet_names.first().cloned().ok_or(DecodeFailure::NoSheets)?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| DecodeFailure::Corrupt(format!("Failed to read sheet '{name}': {e}")))?;

    log::debug!("sheet '{}': {}x{} cells", name, range.height(), range.width());
    Ok(rows_from_range(&range))
}

fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header.iter().map(cell_text).collect();
    assemble(&headers, rows.map(|row| row.iter().map(cell_text).collect()))
}

/// Cell as display text. Integer-valued numbers print without decimals.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        // Excel serial; date formatting is not applied
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// Export
// ============================================================================

/// Longest string Excel accepts in one cell.
const MAX_CELL_CHARS: usize = 32_767;

/// Cut `value` to the cell limit. Merged notes grow with every duplicate.
fn fit_cell<'a>(value: &'a str, row: u32, header: &str) -> Cow<'a, str> {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => {
            log::warn!(
                "row {}: {} truncated to {} characters for xlsx export",
                row + 1,
                header,
                MAX_CELL_CHARS
            );
            Cow::Owned(value[..end].to_string())
        }
        None => Cow::Borrowed(value),
    }
}

/// Write merged entries to a single-sheet workbook with a bold, frozen header row.
pub fn export(entries: &[&MergedEntry], path: &Path) -> Result<(), String> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Merged")
        .map_err(|e| format!("Failed to create sheet: {}", e))?;

    let header_format = Format::new().set_bold();
    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }

    for (i, entry) in entries.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, value) in export_record(entry).iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let value = fit_cell(value, row, EXPORT_HEADERS[col]);
            worksheet
                .write_string(row, col as u16, value.as_ref())
                .map_err(|e| format!("Failed to write row {}: {}", row + 1, e))?;
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to freeze header: {}", e))?;
    for (col, width) in [(0u16, 40.0), (1, 60.0), (2, 20.0), (3, 20.0), (4, 30.0)] {
        worksheet
            .set_column_width(col, width)
            .map_err(|e| format!("Failed to set column width: {}", e))?;
    }

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    use newsmerge_core::{deduplicate, Entry};

    /// Write a workbook fixture: one sheet per `(name, rows)`.
    fn write_fixture(path: &Path, sheets: &[(&str, Vec<Vec<&str>>)]) {
        let mut workbook = XlsxWorkbook::new();
        for (name, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*name).unwrap();
            for (r, cells) in rows.iter().enumerate() {
                for (c, value) in cells.iter().enumerate() {
                    if !value.is_empty() {
                        worksheet.write_string(r as u32, c as u16, *value).unwrap();
                    }
                }
            }
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_reads_first_sheet_by_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file1.xlsx");
        write_fixture(
            &path,
            &[
                (
                    "News",
                    vec![
                        vec!["Title", "Notes", "Company", "Sector"],
                        vec!["Deal A", "Closing Q3", "Acme", ""],
                        vec!["", "", "", ""],
                        vec!["Oil slides", "", "", "Energy"],
                    ],
                ),
                ("Other", vec![vec!["Title"], vec!["Ignored"]]),
            ],
        );

        let rows = read_rows(&path, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Title"], "Deal A");
        assert_eq!(rows[0]["Sector"], "");
        assert_eq!(rows[1]["Sector"], "Energy");
    }

    #[test]
    fn test_named_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        write_fixture(
            &path,
            &[
                ("First", vec![vec!["Title"], vec!["One"]]),
                ("Second", vec![vec!["Headline"], vec!["Two"]]),
            ],
        );

        let rows = read_rows(&path, Some("Second")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Headline"], "Two");

        let err = read_rows(&path, Some("Third")).unwrap_err();
        assert_eq!(err, DecodeFailure::MissingSheet("Third".into()));
    }

    #[test]
    fn test_numbers_render_without_trailing_decimals() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("numbers.xlsx");

        let mut workbook = XlsxWorkbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "Title").unwrap();
        worksheet.write_string(0, 1, "Notes").unwrap();
        worksheet.write_number(1, 0, 2024.0).unwrap();
        worksheet.write_number(1, 1, 12.5).unwrap();
        worksheet.write_boolean(2, 0, true).unwrap();
        workbook.save(&path).unwrap();

        let rows = read_rows(&path, None).unwrap();
        assert_eq!(rows[0]["Title"], "2024");
        assert_eq!(rows[0]["Notes"], "12.5");
        assert_eq!(rows[1]["Title"], "TRUE");
    }

    #[test]
    fn test_reads_from_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mem.xlsx");
        write_fixture(&path, &[("Sheet1", vec![vec!["Title", "Company"], vec!["Deal", "Acme"]])]);

        let rows = read_rows_from_bytes(fs::read(&path).unwrap(), None).unwrap();
        assert_eq!(rows[0]["Company"], "Acme");
    }

    #[test]
    fn test_garbage_bytes_are_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        fs::write(&path, b"this is not a zip archive").unwrap();

        let err = read_rows(&path, None).unwrap_err();
        assert!(matches!(err, DecodeFailure::Corrupt(_)), "got {err:?}");
    }

    #[test]
    fn test_export_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merged.xlsx");
        let merged = deduplicate(vec![
            Entry::new("Deal A", "Alpha", "Acme", "", "Analyst 1"),
            Entry::new("deal a", "Beta", "Acme", "", "Analyst 2"),
            Entry::new("Oil slides", "", "", "Energy", "Analyst 2"),
        ]);
        let refs: Vec<&MergedEntry> = merged.iter().collect();

        export(&refs, &path).unwrap();

        let rows = read_rows(&path, Some("Merged")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Title"], "Deal A");
        assert_eq!(rows[0]["Notes"], "Alpha\n\nAnalyst 2: Beta");
        assert_eq!(rows[0]["Sources"], "Analyst 1, Analyst 2");
        assert_eq!(rows[1]["Company"], "");
        assert_eq!(rows[1]["Sector"], "Energy");
    }

    #[test]
    fn test_oversized_notes_are_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.xlsx");
        let notes = "é".repeat(MAX_CELL_CHARS + 500);
        let merged = deduplicate(vec![Entry::new("Long story", &notes, "Acme", "", "Analyst 1")]);
        let refs: Vec<&MergedEntry> = merged.iter().collect();

        export(&refs, &path).unwrap();

        let rows = read_rows(&path, None).unwrap();
        assert_eq!(rows[0]["Notes"].chars().count(), MAX_CELL_CHARS);
        assert_eq!(rows[0]["Title"], "Long story");
    }

    #[test]
    fn test_fit_cell_leaves_short_values() {
        assert!(matches!(fit_cell("short", 1, "Notes"), Cow::Borrowed("short")));
    }
}
