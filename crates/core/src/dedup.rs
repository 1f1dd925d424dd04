use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Entry, MergedEntry};

/// Identity of an entry: trimmed, lowercased title.
pub fn identity_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Counts from one dedup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub input_entries: usize,
    pub merged_entries: usize,
    pub duplicates_folded: usize,
}

/// Fold entries sharing an identity key. Output is in first-occurrence order.
pub fn deduplicate(entries: Vec<Entry>) -> Vec<MergedEntry> {
    deduplicate_with_stats(entries).0
}

pub fn deduplicate_with_stats(entries: Vec<Entry>) -> (Vec<MergedEntry>, MergeStats) {
    let input_entries = entries.len();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<MergedEntry> = Vec::new();

    for entry in entries {
        let key = identity_key(&entry.title);
        match slots.get(&key) {
            Some(&idx) => {
                let existing = &mut merged[idx];
                existing.notes.push_str("\n\n");
                existing.notes.push_str(&entry.source);
                existing.notes.push_str(": ");
                existing.notes.push_str(&entry.notes);
                existing.sources.push(entry.source);
            }
            None => {
                slots.insert(key, merged.len());
                merged.push(MergedEntry::from(entry));
            }
        }
    }

    let stats = MergeStats {
        input_entries,
        merged_entries: merged.len(),
        duplicates_folded: input_entries - merged.len(),
    };
    log::debug!(
        "dedup: {} entries -> {} merged ({} folded)",
        stats.input_entries,
        stats.merged_entries,
        stats.duplicates_folded
    );

    (merged, stats)
}
