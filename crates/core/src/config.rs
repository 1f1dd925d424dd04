use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::search::{SearchOptions, DEFAULT_THRESHOLD};
use crate::tags::EmptyTagPolicy;
use crate::view::Composition;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A batch manifest (`*.merge.toml`): which files to load and how to merge them.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub files: Vec<FileConfig>,
    #[serde(default)]
    pub fields: FieldAliases,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub tags: TagConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

// ---------------------------------------------------------------------------
// Files + labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub path: String,
    /// Explicit source label. Falls back to the batch labeling rule.
    #[serde(default)]
    pub label: Option<String>,
    /// Sheet to read. Defaults to the first sheet.
    #[serde(default)]
    pub sheet: Option<String>,
}

/// How a source label is derived for a file that has no explicit label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelRule {
    /// File name contains `'1'` ⇒ "Analyst 1", otherwise "Analyst 2".
    #[default]
    FilenameDigit,
    /// The file name without its extension.
    FileStem,
}

impl LabelRule {
    pub fn label_for(&self, file_name: &str) -> String {
        match self {
            Self::FilenameDigit => {
                if file_name.contains('1') {
                    "Analyst 1".to_string()
                } else {
                    "Analyst 2".to_string()
                }
            }
            Self::FileStem => Path::new(file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.to_string()),
        }
    }
}

impl std::fmt::Display for LabelRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FilenameDigit => write!(f, "filename_digit"),
            Self::FileStem => write!(f, "file_stem"),
        }
    }
}

// ---------------------------------------------------------------------------
// Field aliases
// ---------------------------------------------------------------------------

/// Column headers tried, in order, for each entry field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldAliases {
    pub title: Vec<String>,
    pub notes: Vec<String>,
    pub company: Vec<String>,
    pub sector: Vec<String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            title: vec!["Title".into(), "Headline".into()],
            notes: vec!["Notes".into(), "Details".into()],
            company: vec!["Company".into()],
            sector: vec!["Sector".into()],
        }
    }
}

impl FieldAliases {
    /// Every header any field recognizes.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.title
            .iter()
            .chain(&self.notes)
            .chain(&self.company)
            .chain(&self.sector)
            .map(String::as_str)
    }

    fn validate(&self) -> Result<(), MergeError> {
        for (field, aliases) in [
            ("title", &self.title),
            ("notes", &self.notes),
            ("company", &self.company),
            ("sector", &self.sector),
        ] {
            if aliases.is_empty() || aliases.iter().any(|a| a.is_empty()) {
                return Err(MergeError::ConfigValidation(format!(
                    "fields.{field} needs at least one non-empty column name"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Search / tags / view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagConfig {
    #[serde(default)]
    pub empty: EmptyTagPolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewConfig {
    #[serde(default)]
    pub composition: Composition,
    #[serde(default)]
    pub labeling: LabelRule,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl BatchConfig {
    pub fn from_toml(input: &str) -> Result<Self, MergeError> {
        let config: BatchConfig =
            toml::from_str(input).map_err(|e| MergeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MergeError> {
        if self.files.is_empty() {
            return Err(MergeError::ConfigValidation(
                "at least one [[files]] entry is required".into(),
            ));
        }

        for (i, file) in self.files.iter().enumerate() {
            if file.path.trim().is_empty() {
                return Err(MergeError::ConfigValidation(format!(
                    "files[{i}]: path must not be empty"
                )));
            }
            if matches!(file.label.as_deref(), Some(l) if l.trim().is_empty()) {
                return Err(MergeError::ConfigValidation(format!(
                    "files[{i}] ('{}'): label must not be empty",
                    file.path
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.search.threshold) {
            return Err(MergeError::ConfigValidation(format!(
                "search.threshold must be between 0 and 1, got {}",
                self.search.threshold
            )));
        }

        self.fields.validate()
    }

    /// Label for `files[index]`: explicit label, else the labeling rule over the file name.
    pub fn label_for(&self, index: usize) -> Option<String> {
        let file = self.files.get(index)?;
        if let Some(label) = &file.label {
            return Some(label.clone());
        }
        let name = Path::new(&file.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.path.clone());
        Some(self.view.labeling.label_for(&name))
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions { threshold: self.search.threshold }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
