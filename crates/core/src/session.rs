//! Session state for one analyst: the merged set, its tags and the active view.
//!
//! Each load is a batch with a generation number. Starting a batch resets all
//! state; completing a batch whose generation is no longer current is rejected
//! so late results from a superseded load never leak into the new one.

use serde::Serialize;

use crate::config::{BatchConfig, FieldAliases};
use crate::dedup::{deduplicate_with_stats, MergeStats};
use crate::error::{DecodeError, MergeError, SchemaWarning};
use crate::model::{MergedEntry, RawRow};
use crate::normalize::normalize_rows;
use crate::search::{search, SearchOptions};
use crate::tags::{entries_with_tag, EmptyTagPolicy, TagIndex};
use crate::view::{Composition, ViewState};

// ---------------------------------------------------------------------------
// Batch input
// ---------------------------------------------------------------------------

/// Rows decoded from one file, with the source label they will carry.
#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub name: String,
    pub label: String,
    pub rows: Vec<RawRow>,
}

pub type FileOutcome = Result<DecodedFile, DecodeError>;

/// Handle for a batch in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchTicket {
    generation: u64,
}

impl BatchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ---------------------------------------------------------------------------
// Batch output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generation: u64,
    pub run_at: String,
    pub files_loaded: usize,
    pub rows_read: usize,
    pub stats: MergeStats,
    pub tags: usize,
    pub decode_errors: Vec<DecodeError>,
    pub warnings: Vec<SchemaWarning>,
}

impl BatchReport {
    /// Every file in the batch failed to decode.
    pub fn all_failed(&self) -> bool {
        self.files_loaded == 0 && !self.decode_errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub fields: FieldAliases,
    pub search: SearchOptions,
    pub empty_tags: EmptyTagPolicy,
    pub composition: Composition,
}

impl SessionOptions {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            fields: config.fields.clone(),
            search: config.search_options(),
            empty_tags: config.tags.empty,
            composition: config.view.composition,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Session {
    options: SessionOptions,
    generation: u64,
    entries: Vec<MergedEntry>,
    tags: TagIndex,
    view: ViewState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let tags = TagIndex::new(options.empty_tags);
        Self {
            options,
            generation: 0,
            entries: Vec::new(),
            tags,
            view: ViewState::default(),
        }
    }

    /// Start a new batch: bumps the generation and clears entries, tags and view.
    pub fn begin_batch(&mut self) -> BatchTicket {
        self.generation += 1;
        self.entries.clear();
        self.tags.clear();
        self.view.clear();
        log::debug!("batch {} started", self.generation);
        BatchTicket { generation: self.generation }
    }

    pub fn is_current(&self, ticket: BatchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Merge every decoded file, in the order given, into the session.
    ///
    /// Files that failed to decode are reported and skipped; the rest still merge.
    pub fn complete_batch(
        &mut self,
        ticket: BatchTicket,
        files: Vec<FileOutcome>,
    ) -> Result<BatchReport, MergeError> {
        if !self.is_current(ticket) {
            log::warn!(
                "discarding results of batch {} (current batch is {})",
                ticket.generation,
                self.generation
            );
            return Err(MergeError::StaleBatch {
                ticket: ticket.generation,
                current: self.generation,
            });
        }

        let mut all_entries = Vec::new();
        let mut warnings = Vec::new();
        let mut decode_errors = Vec::new();
        let mut files_loaded = 0;
        let mut rows_read = 0;

        self.tags.clear();
        for outcome in files {
            match outcome {
                Ok(file) => {
                    let (entries, file_warnings) =
                        normalize_rows(&file.rows, &file.label, Some(&file.name), &self.options.fields);
                    log::debug!("{}: {} rows as '{}'", file.name, file.rows.len(), file.label);
                    for entry in &entries {
                        self.tags.register_entry(entry);
                    }
                    files_loaded += 1;
                    rows_read += file.rows.len();
                    all_entries.extend(entries);
                    warnings.extend(file_warnings);
                }
                Err(err) => {
                    log::warn!("{err}");
                    decode_errors.push(err);
                }
            }
        }

        let (merged, stats) = deduplicate_with_stats(all_entries);
        self.entries = merged;
        self.view.clear();

        log::info!(
            "batch {}: {} files, {} rows, {} merged entries, {} tags",
            self.generation,
            files_loaded,
            rows_read,
            stats.merged_entries,
            self.tags.len()
        );

        Ok(BatchReport {
            generation: self.generation,
            run_at: chrono::Utc::now().to_rfc3339(),
            files_loaded,
            rows_read,
            stats,
            tags: self.tags.display_labels().count(),
            decode_errors,
            warnings,
        })
    }

    /// Begin and complete a batch in one step.
    pub fn load(&mut self, files: Vec<FileOutcome>) -> Result<BatchReport, MergeError> {
        let ticket = self.begin_batch();
        self.complete_batch(ticket, files)
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The full dedup output.
    pub fn entries(&self) -> &[MergedEntry] {
        &self.entries
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn select_tag(&mut self, tag: impl Into<String>) {
        self.view.select_tag(tag, self.options.composition);
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.view.set_query(query, self.options.composition);
    }

    pub fn clear_view(&mut self) {
        self.view.clear();
    }

    /// Entries the presenter should show right now.
    pub fn visible(&self) -> Vec<&MergedEntry> {
        self.view.apply(&self.entries, &self.options.search)
    }

    pub fn entries_with_tag(&self, tag: &str) -> Vec<&MergedEntry> {
        entries_with_tag(tag, &self.entries)
    }

    pub fn search(&self, query: &str) -> Vec<&MergedEntry> {
        search(&self.entries, query, &self.options.search)
    }
}
