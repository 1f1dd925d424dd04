//! Fuzzy search over merged entries.
//!
//! Scores run from 0.0 (perfect) to 1.0 (no resemblance). A field scores 0.0
//! when it contains the query verbatim (case-insensitive); otherwise the query
//! is compared against every run of consecutive words of the same length, both
//! whole and cut to the query's length, and the best similarity wins. An entry
//! matches when its best field score is at or under the threshold.

use ordered_float::OrderedFloat;
use strsim::normalized_damerau_levenshtein;

use crate::model::MergedEntry;

/// Admits a typo or two in short words, rejects unrelated text.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

/// Lowercased copy of one searchable field, pre-split into words.
#[derive(Debug)]
struct Field {
    text: String,
    words: Vec<String>,
}

impl Field {
    fn new(raw: &str) -> Self {
        let text = raw.to_lowercase();
        let words = text.split_whitespace().map(str::to_string).collect();
        Self { text, words }
    }

    fn score(&self, query: &Query) -> f64 {
        if self.text.is_empty() {
            return 1.0;
        }
        if self.text.contains(&query.text) {
            return 0.0;
        }
        if query.words.is_empty() || self.words.is_empty() {
            return 1.0;
        }

        let width = query.words.len().min(self.words.len());
        let mut best = 0.0f64;
        for window in self.words.windows(width) {
            let joined = window.join(" ");
            let whole = normalized_damerau_levenshtein(&query.joined, &joined);
            let cut: String = joined.chars().take(query.char_len).collect();
            let prefix = normalized_damerau_levenshtein(&query.joined, &cut);
            best = best.max(whole).max(prefix);
            if best >= 1.0 {
                break;
            }
        }
        (1.0 - best).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
struct Query {
    text: String,
    words: Vec<String>,
    joined: String,
    char_len: usize,
}

impl Query {
    fn new(raw: &str) -> Self {
        let text = raw.to_lowercase();
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let joined = words.join(" ");
        let char_len = joined.chars().count();
        Self { text, words, joined, char_len }
    }
}

/// Searchable view of an entry: title, notes, company, sector.
#[derive(Debug)]
struct Doc {
    fields: [Field; 4],
}

impl Doc {
    fn new(entry: &MergedEntry) -> Self {
        Self {
            fields: [
                Field::new(&entry.title),
                Field::new(&entry.notes),
                Field::new(&entry.company),
                Field::new(&entry.sector),
            ],
        }
    }

    fn score(&self, query: &Query) -> f64 {
        self.fields
            .iter()
            .map(|f| f.score(query))
            .fold(1.0, f64::min)
    }
}

/// Index over a merged collection. Cheap to build; callers normally rebuild
/// it for each query.
#[derive(Debug)]
pub struct SearchIndex<'a> {
    entries: &'a [MergedEntry],
    docs: Vec<Doc>,
    options: SearchOptions,
}

impl<'a> SearchIndex<'a> {
    pub fn build(entries: &'a [MergedEntry], options: SearchOptions) -> Self {
        let docs = entries.iter().map(Doc::new).collect();
        Self { entries, docs, options }
    }

    /// Matches ranked best-first, with their scores. Ties keep collection order.
    pub fn query_scored(&self, query: &str) -> Vec<(&'a MergedEntry, f64)> {
        if query.is_empty() {
            return self.entries.iter().map(|e| (e, 0.0)).collect();
        }

        let query = Query::new(query);
        let mut hits: Vec<(usize, f64)> = self
            .docs
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, doc.score(&query)))
            .filter(|(_, score)| *score <= self.options.threshold)
            .collect();

        hits.sort_by_key(|&(i, score)| (OrderedFloat(score), i));

        let entries = self.entries;
        hits.into_iter().map(|(i, score)| (&entries[i], score)).collect()
    }

    pub fn query(&self, query: &str) -> Vec<&'a MergedEntry> {
        self.query_scored(query).into_iter().map(|(e, _)| e).collect()
    }
}

/// Search the full collection. An empty query returns every entry, in order.
pub fn search<'a>(entries: &'a [MergedEntry], query: &str, options: &SearchOptions) -> Vec<&'a MergedEntry> {
    SearchIndex::build(entries, *options).query(query)
}

pub fn search_scored<'a>(
    entries: &'a [MergedEntry],
    query: &str,
    options: &SearchOptions,
) -> Vec<(&'a MergedEntry, f64)> {
    SearchIndex::build(entries, *options).query_scored(query)
}
