//! Row → [`Entry`] normalization.
//!
//! Best effort: missing or empty fields fall back to defaults. A row with no
//! recognized column at all still becomes an entry, and the caller gets a
//! [`SchemaWarning`] for it.

use crate::config::FieldAliases;
use crate::error::SchemaWarning;
use crate::model::{Entry, RawRow, UNTITLED};

/// Result of normalizing one row.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub entry: Entry,
    /// False when none of the recognized columns carried a value.
    pub recognized: bool,
}

/// First alias with a non-empty value. Whitespace-only values count as present.
fn first_present<'a>(row: &'a RawRow, aliases: &[String]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|alias| row.get(alias))
        .map(String::as_str)
        .find(|v| !v.is_empty())
}

pub fn normalize_row(row: &RawRow, source: &str, fields: &FieldAliases) -> Normalized {
    let title = first_present(row, &fields.title);
    let notes = first_present(row, &fields.notes);
    let company = first_present(row, &fields.company);
    let sector = first_present(row, &fields.sector);

    let recognized = title.is_some() || notes.is_some() || company.is_some() || sector.is_some();

    Normalized {
        entry: Entry::new(
            title.unwrap_or(UNTITLED),
            notes.unwrap_or(""),
            company.unwrap_or(""),
            sector.unwrap_or(""),
            source,
        ),
        recognized,
    }
}

/// Normalize a file's rows in order. Warnings carry 1-based data row numbers.
pub fn normalize_rows(
    rows: &[RawRow],
    source: &str,
    file: Option<&str>,
    fields: &FieldAliases,
) -> (Vec<Entry>, Vec<SchemaWarning>) {
    let mut entries = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let normalized = normalize_row(row, source, fields);
        if !normalized.recognized {
            let warning = SchemaWarning {
                source: source.to_string(),
                file: file.map(str::to_string),
                row: i + 1,
            };
            log::warn!("{warning}");
            warnings.push(warning);
        }
        entries.push(normalized.entry);
    }

    (entries, warnings)
}
