use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{Entry, MergedEntry};

/// What to do with a blank company/sector when building the tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTagPolicy {
    /// Blank values never enter the tag set.
    #[default]
    Suppress,
    /// Blank values are stored as `""` (legacy behavior). They are still
    /// never returned by [`TagIndex::display_labels`].
    Preserve,
}

impl std::fmt::Display for EmptyTagPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Suppress => write!(f, "suppress"),
            Self::Preserve => write!(f, "preserve"),
        }
    }
}

/// Distinct company/sector labels seen in the current batch, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    policy: EmptyTagPolicy,
    labels: Vec<String>,
    seen: HashSet<String>,
}

impl TagIndex {
    pub fn new(policy: EmptyTagPolicy) -> Self {
        Self { policy, ..Default::default() }
    }

    pub fn policy(&self) -> EmptyTagPolicy {
        self.policy
    }

    pub fn register(&mut self, label: &str) {
        if label.is_empty() && self.policy == EmptyTagPolicy::Suppress {
            return;
        }
        if self.seen.insert(label.to_string()) {
            self.labels.push(label.to_string());
        }
    }

    /// Company first, then sector.
    pub fn register_entry(&mut self, entry: &Entry) {
        self.register(&entry.company);
        self.register(&entry.sector);
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.seen.clear();
    }

    /// Every stored label, including `""` under [`EmptyTagPolicy::Preserve`].
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Labels a presenter should offer as filters.
    pub fn display_labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str).filter(|l| !l.is_empty())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.seen.contains(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Entries carrying `tag` (exact match), in collection order.
pub fn entries_with_tag<'a>(tag: &str, collection: &'a [MergedEntry]) -> Vec<&'a MergedEntry> {
    collection.iter().filter(|e| e.has_tag(tag)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::deduplicate;

    #[test]
    fn suppress_skips_blank_labels() {
        let mut idx = TagIndex::new(EmptyTagPolicy::Suppress);
        idx.register_entry(&Entry::new("A", "", "Acme", "", "s"));
        idx.register_entry(&Entry::new("B", "", "", "Energy", "s"));
        assert_eq!(idx.labels(), &["Acme", "Energy"]);
        assert!(!idx.contains(""));
    }

    #[test]
    fn preserve_keeps_blank_but_hides_it() {
        let mut idx = TagIndex::new(EmptyTagPolicy::Preserve);
        idx.register_entry(&Entry::new("A", "", "Acme", "", "s"));
        idx.register_entry(&Entry::new("B", "", "", "", "s"));
        assert_eq!(idx.labels(), &["Acme", ""]);
        assert!(idx.contains(""));
        let shown: Vec<_> = idx.display_labels().collect();
        assert_eq!(shown, vec!["Acme"]);
    }

    #[test]
    fn labels_are_distinct_in_first_seen_order() {
        let mut idx = TagIndex::default();
        for label in ["Globex", "Acme", "Globex", "Energy", "Acme"] {
            idx.register(label);
        }
        assert_eq!(idx.labels(), &["Globex", "Acme", "Energy"]);
        assert_eq!(idx.len(), 3);
    }

    #[test]
    fn clear_resets() {
        let mut idx = TagIndex::default();
        idx.register("Acme");
        idx.clear();
        assert!(idx.is_empty());
        idx.register("Acme");
        assert_eq!(idx.labels(), &["Acme"]);
    }

    #[test]
    fn filter_is_order_preserving_subsequence() {
        let merged = deduplicate(vec![
            Entry::new("One", "", "Acme", "", "s"),
            Entry::new("Two", "", "Globex", "", "s"),
            Entry::new("Three", "", "Acme", "Energy", "s"),
        ]);
        let hits: Vec<_> = entries_with_tag("Acme", &merged)
            .into_iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(hits, vec!["One", "Three"]);

        assert_eq!(entries_with_tag("Energy", &merged).len(), 1);
        assert!(entries_with_tag("acme", &merged).is_empty());
        assert!(entries_with_tag("", &merged).is_empty());
    }
}
