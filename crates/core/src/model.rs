use std::collections::HashMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One decoded spreadsheet row: header → cell text. Empty cells are `""`.
pub type RawRow = HashMap<String, String>;

/// Title used when a row has neither a title nor a headline.
pub const UNTITLED: &str = "Untitled";

// ---------------------------------------------------------------------------
// Normalized
// ---------------------------------------------------------------------------

/// A single normalized row, tagged with the label of the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub title: String,
    pub notes: String,
    pub company: String,
    pub sector: String,
    pub source: String,
    pub tags: Vec<String>,
}

impl Entry {
    /// Builds an entry and derives `tags` from the non-empty company/sector.
    pub fn new(
        title: impl Into<String>,
        notes: impl Into<String>,
        company: impl Into<String>,
        sector: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let company = company.into();
        let sector = sector.into();
        let tags = [&company, &sector]
            .into_iter()
            .filter(|v| !v.is_empty())
            .cloned()
            .collect();
        Self {
            title: title.into(),
            notes: notes.into(),
            company,
            sector,
            source: source.into(),
            tags,
        }
    }
}

// ---------------------------------------------------------------------------
// Merged
// ---------------------------------------------------------------------------

/// All entries sharing one identity key, folded together.
///
/// `title`, `company`, `sector`, `tags` and `source` come from the first
/// occurrence. `notes` is the first occurrence's notes followed by one
/// `"\n\n{source}: {notes}"` block per later duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedEntry {
    pub title: String,
    pub notes: String,
    pub company: String,
    pub sector: String,
    pub source: String,
    pub tags: Vec<String>,
    pub sources: Vec<String>,
}

impl MergedEntry {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Contributing source labels as shown on a card.
    pub fn sources_line(&self) -> String {
        self.sources.join(", ")
    }
}

impl From<Entry> for MergedEntry {
    fn from(entry: Entry) -> Self {
        let sources = vec![entry.source.clone()];
        Self {
            title: entry.title,
            notes: entry.notes,
            company: entry.company,
            sector: entry.sector,
            source: entry.source,
            tags: entry.tags,
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_skip_empty_values() {
        let e = Entry::new("Deal", "", "", "Energy", "Analyst 1");
        assert_eq!(e.tags, vec!["Energy"]);

        let e = Entry::new("Deal", "", "Acme", "Energy", "Analyst 1");
        assert_eq!(e.tags, vec!["Acme", "Energy"]);

        let e = Entry::new("Deal", "", "", "", "Analyst 1");
        assert!(e.tags.is_empty());
    }

    #[test]
    fn merged_from_entry_seeds_sources() {
        let merged = MergedEntry::from(Entry::new("Deal", "n", "Acme", "", "Analyst 2"));
        assert_eq!(merged.sources, vec!["Analyst 2"]);
        assert_eq!(merged.source, "Analyst 2");
        assert!(merged.has_tag("Acme"));
        assert!(!merged.has_tag("acme"));
    }

    #[test]
    fn sources_line_joins_with_comma() {
        let mut merged = MergedEntry::from(Entry::new("Deal", "", "", "", "Analyst 1"));
        merged.sources.push("Analyst 2".into());
        assert_eq!(merged.sources_line(), "Analyst 1, Analyst 2");
    }
}
