//! Presenter: entry cards for the terminal and the `--json` document.

use std::io::{self, Write};

use serde::Serialize;

use newsmerge_core::{BatchReport, MergedEntry, TagIndex};

use crate::CliError;

/// One card: title, notes (line breaks kept), tag line, sources line.
pub(crate) fn write_card<W: Write>(w: &mut W, entry: &MergedEntry, score: Option<f64>) -> io::Result<()> {
    writeln!(w, "{}", entry.title)?;
    if !entry.notes.is_empty() {
        writeln!(w, "{}", entry.notes)?;
    }
    writeln!(w, "Companies: {} | Sector: {}", entry.company, entry.sector)?;
    writeln!(w, "Sources: {}", entry.sources_line())?;
    if let Some(score) = score {
        writeln!(w, "Score: {:.3}", score)?;
    }
    Ok(())
}

/// Cards separated by a blank line, in the order given.
pub(crate) fn write_cards<W: Write>(w: &mut W, entries: &[&MergedEntry]) -> io::Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        write_card(w, entry, None)?;
    }
    Ok(())
}

pub(crate) fn write_scored_cards<W: Write>(w: &mut W, hits: &[(&MergedEntry, f64)]) -> io::Result<()> {
    for (i, (entry, score)) in hits.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        write_card(w, entry, Some(*score))?;
    }
    Ok(())
}

pub(crate) fn print_cards(entries: &[&MergedEntry]) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    write_cards(&mut out, entries).map_err(|e| CliError::io(e.to_string()))
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub(crate) struct JsonOutput<'a> {
    report: &'a BatchReport,
    tags: Vec<&'a str>,
    entries: &'a [&'a MergedEntry],
}

pub(crate) fn json_document<'a>(
    report: &'a BatchReport,
    tags: &'a TagIndex,
    entries: &'a [&'a MergedEntry],
) -> JsonOutput<'a> {
    JsonOutput {
        report,
        tags: tags.display_labels().collect(),
        entries,
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary (stderr)
// ---------------------------------------------------------------------------

pub(crate) fn summary_line(report: &BatchReport, shown: usize) -> String {
    let mut line = format!(
        "merged {} entries from {} file(s), {} rows ({} duplicates folded); showing {}",
        report.stats.merged_entries,
        report.files_loaded,
        report.rows_read,
        report.stats.duplicates_folded,
        shown
    );
    if !report.decode_errors.is_empty() {
        line.push_str(&format!("; {} file(s) failed to decode", report.decode_errors.len()));
    }
    if !report.warnings.is_empty() {
        line.push_str(&format!("; {} row(s) without recognized columns", report.warnings.len()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsmerge_core::session::DecodedFile;
    use newsmerge_core::{deduplicate, Entry, Session};

    fn render(entries: &[&MergedEntry]) -> String {
        let mut buf = Vec::new();
        write_cards(&mut buf, entries).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn card_layout() {
        let merged = deduplicate(vec![
            Entry::new("Deal A", "Alpha", "Acme", "Industrials", "Analyst 1"),
            Entry::new("deal a", "Beta", "Acme", "", "Analyst 2"),
        ]);
        let refs: Vec<&MergedEntry> = merged.iter().collect();
        assert_eq!(
            render(&refs),
            "Deal A\nAlpha\n\nAnalyst 2: Beta\nCompanies: Acme | Sector: Industrials\nSources: Analyst 1, Analyst 2\n"
        );
    }

    #[test]
    fn cards_are_separated_and_empty_notes_skipped() {
        let merged = deduplicate(vec![
            Entry::new("One", "", "", "Energy", "A"),
            Entry::new("Two", "", "Globex", "", "B"),
        ]);
        let refs: Vec<&MergedEntry> = merged.iter().collect();
        assert_eq!(
            render(&refs),
            "One\nCompanies:  | Sector: Energy\nSources: A\n\nTwo\nCompanies: Globex | Sector: \nSources: B\n"
        );
    }

    #[test]
    fn score_line_when_requested() {
        let merged = deduplicate(vec![Entry::new("Tesla recall", "", "", "", "A")]);
        let mut buf = Vec::new();
        write_scored_cards(&mut buf, &[(&merged[0], 0.2)]).unwrap();
        assert!(String::from_utf8(buf).unwrap().ends_with("Score: 0.200\n"));
    }

    #[test]
    fn json_document_shape() {
        let mut session = Session::default();
        let report = session
            .load(vec![Ok(DecodedFile {
                name: "file1.csv".into(),
                label: "Analyst 1".into(),
                rows: vec![[("Title", "Deal"), ("Company", "Acme")]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()],
            })])
            .unwrap();
        let visible = session.visible();

        let doc = serde_json::to_value(json_document(&report, session.tags(), &visible)).unwrap();
        assert_eq!(doc["tags"], serde_json::json!(["Acme"]));
        assert_eq!(doc["entries"][0]["sources"], serde_json::json!(["Analyst 1"]));
        assert_eq!(doc["report"]["files_loaded"], 1);
        assert_eq!(doc["report"]["stats"]["merged_entries"], 1);
    }
}
