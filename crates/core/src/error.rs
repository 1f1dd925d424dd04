use std::fmt;

use serde::Serialize;

#[derive(Debug)]
pub enum MergeError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (no files, bad threshold, empty alias list, etc.).
    ConfigValidation(String),
    /// A batch was completed after a newer batch had already started.
    StaleBatch { ticket: u64, current: u64 },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::StaleBatch { ticket, current } => {
                write!(f, "batch {ticket} was superseded by batch {current}; results discarded")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for MergeError {}

/// Why a file could not be turned into rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DecodeFailure {
    /// The file could not be read from disk.
    Unreadable(String),
    /// The bytes are not a workbook / delimited file we can parse.
    Corrupt(String),
    /// Extension we have no decoder for.
    UnsupportedFormat(String),
    /// Workbook has no sheets at all.
    NoSheets,
    /// A specific sheet was requested and is not present.
    MissingSheet(String),
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(msg) => write!(f, "cannot read file: {msg}"),
            Self::Corrupt(msg) => write!(f, "cannot decode file: {msg}"),
            Self::UnsupportedFormat(ext) => write!(f, "unsupported file type '{ext}'"),
            Self::NoSheets => write!(f, "workbook contains no sheets"),
            Self::MissingSheet(name) => write!(f, "sheet '{name}' not found"),
        }
    }
}

/// A file in the batch that produced no rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeError {
    pub file: String,
    pub reason: DecodeFailure,
}

impl DecodeError {
    pub fn new(file: impl Into<String>, reason: DecodeFailure) -> Self {
        Self { file: file.into(), reason }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.reason)
    }
}

impl std::error::Error for DecodeError {}

/// A row that carried none of the recognized fields; defaults were applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaWarning {
    pub source: String,
    /// File the row came from, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-based data row (header row excluded).
    pub row: usize,
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(
                f,
                "{file} row {}: no recognized columns, defaults applied ({})",
                self.row, self.source
            ),
            None => write!(
                f,
                "row {}: no recognized columns, defaults applied ({})",
                self.row, self.source
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_batch_message_names_both_generations() {
        let err = MergeError::StaleBatch { ticket: 2, current: 3 };
        let msg = err.to_string();
        assert!(msg.contains("batch 2"));
        assert!(msg.contains("batch 3"));
    }

    #[test]
    fn decode_error_display() {
        let err = DecodeError::new("notes.pdf", DecodeFailure::UnsupportedFormat("pdf".into()));
        assert_eq!(err.to_string(), "notes.pdf: unsupported file type 'pdf'");
    }

    #[test]
    fn schema_warning_serializes_without_file() {
        let w = SchemaWarning { source: "Analyst 1".into(), file: None, row: 4 };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["row"], 4);
        assert!(json.get("file").is_none());
    }
}
