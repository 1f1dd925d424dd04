//! What the presenter shows: the merged set narrowed by a tag and/or a query.
//!
//! Both filters always start from the full dedup output, never from whatever
//! is currently displayed.

use serde::{Deserialize, Serialize};

use crate::model::MergedEntry;
use crate::search::{search, SearchOptions};
use crate::tags::entries_with_tag;

/// How a selected tag and a search query interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Composition {
    /// Last action wins: picking a tag clears the query, any query edit
    /// (including clearing it) drops the tag.
    #[default]
    Override,
    /// Both apply: search results restricted to entries carrying the tag.
    Intersect,
}

impl std::fmt::Display for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Override => write!(f, "override"),
            Self::Intersect => write!(f, "intersect"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub tag: Option<String>,
    pub query: String,
}

impl ViewState {
    pub fn select_tag(&mut self, tag: impl Into<String>, composition: Composition) {
        self.tag = Some(tag.into());
        if composition == Composition::Override {
            self.query.clear();
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>, composition: Composition) {
        self.query = query.into();
        if composition == Composition::Override {
            self.tag = None;
        }
    }

    pub fn clear_tag(&mut self) {
        self.tag = None;
    }

    pub fn clear(&mut self) {
        self.tag = None;
        self.query.clear();
    }

    /// Entries to display, given the full merged collection.
    ///
    /// Under [`Composition::Override`] at most one of tag/query is set at a
    /// time, so the same code path serves both modes.
    pub fn apply<'a>(&self, entries: &'a [MergedEntry], options: &SearchOptions) -> Vec<&'a MergedEntry> {
        match (&self.tag, self.query.is_empty()) {
            (None, _) => search(entries, &self.query, options),
            (Some(tag), true) => entries_with_tag(tag, entries),
            (Some(tag), false) => search(entries, &self.query, options)
                .into_iter()
                .filter(|e| e.has_tag(tag))
                .collect(),
        }
    }
}
