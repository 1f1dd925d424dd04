// CSV/TSV decoding and export

use std::io::Read;
use std::path::Path;

use newsmerge_core::{DecodeFailure, MergedEntry, RawRow};

use crate::export::{export_record, EXPORT_HEADERS};
use crate::rows::assemble;

/// Decode a delimited file into rows keyed by its header line.
///
/// `delimiter` of `None` sniffs it from the content.
pub fn read_rows(path: &Path, delimiter: Option<u8>) -> Result<Vec<RawRow>, DecodeFailure> {
    let content = read_file_as_utf8(path).map_err(|e| DecodeFailure::Unreadable(e.to_string()))?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    rows_from_str(&content, delimiter)
}

pub fn rows_from_str(content: &str, delimiter: u8) -> Result<Vec<RawRow>, DecodeFailure> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| DecodeFailure::Corrupt(e.to_string()))?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let mut records = records.into_iter();
    let Some(headers) = records.next() else {
        return Ok(Vec::new());
    };
    Ok(assemble(&headers, records))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub(crate) fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Header line must split into >1 field
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // lines agreeing with the header's field count, weighted by that count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Excel-exported CSVs are often Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Write merged entries as CSV, one row per entry, sources joined by ", ".
pub fn export(entries: &[&MergedEntry], path: &Path) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer.write_record(EXPORT_HEADERS).map_err(|e| e.to_string())?;
    for entry in entries {
        writer
            .write_record(&export_record(entry))
            .map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
