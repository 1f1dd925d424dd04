// Batch loading: decode every file of a batch in parallel, then hand the
// results to the session in file-list order.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use newsmerge_core::{
    BatchConfig, BatchReport, DecodeError, DecodeFailure, DecodedFile, FileOutcome, LabelRule,
    MergeError, RawRow, Session,
};

// ---------------------------------------------------------------------------
// File kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// xlsx, xlsm, xlsb, xls, ods: decoded by calamine.
    Workbook,
    /// csv/txt (sniffed delimiter) or tsv (tab).
    Delimited(Option<u8>),
}

impl SourceKind {
    pub fn detect(path: &Path) -> Result<Self, DecodeFailure> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "xlam" | "ods" => Ok(Self::Workbook),
            "csv" | "txt" => Ok(Self::Delimited(None)),
            "tsv" | "tab" => Ok(Self::Delimited(Some(b'\t'))),
            "" => Err(DecodeFailure::UnsupportedFormat("(no extension)".into())),
            other => Err(DecodeFailure::UnsupportedFormat(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// File specs
// ---------------------------------------------------------------------------

/// One file of a batch, with an optional explicit label and sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub path: PathBuf,
    pub label: Option<String>,
    pub sheet: Option<String>,
}

impl FileSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            label: None,
            sheet: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// File name as shown in reports and used by the labeling rule.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Explicit label if one was given, else the labeling rule over the file name.
    pub fn resolve_label(&self, rule: LabelRule) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => rule.label_for(&self.display_name()),
        }
    }

    /// Specs for every file in a manifest. Relative paths resolve against `base_dir`
    /// (normally the manifest's directory); labels are resolved up front.
    pub fn from_config(config: &BatchConfig, base_dir: &Path) -> Vec<FileSpec> {
        config
            .files
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let path = Path::new(&file.path);
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    base_dir.join(path)
                };
                FileSpec {
                    path,
                    label: config.label_for(i),
                    sheet: file.sheet.clone(),
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Decode + load
// ---------------------------------------------------------------------------

fn decode_rows(spec: &FileSpec) -> Result<Vec<RawRow>, DecodeFailure> {
    match SourceKind::detect(&spec.path)? {
        SourceKind::Workbook => crate::xlsx::read_rows(&spec.path, spec.sheet.as_deref()),
        SourceKind::Delimited(delimiter) => {
            if let Some(sheet) = &spec.sheet {
                log::debug!("{}: ignoring sheet '{}' for a delimited file", spec.display_name(), sheet);
            }
            crate::csv::read_rows(&spec.path, delimiter)
        }
    }
}

/// Decode one file into labeled rows.
pub fn decode_file(spec: &FileSpec, rule: LabelRule) -> FileOutcome {
    let name = spec.display_name();
    let rows = decode_rows(spec).map_err(|reason| DecodeError::new(name.clone(), reason))?;
    log::debug!("decoded {}: {} rows", name, rows.len());
    Ok(DecodedFile {
        label: spec.resolve_label(rule),
        name,
        rows,
    })
}

/// Decode all files in parallel. Outcomes come back in `specs` order no
/// matter which file finishes first.
pub fn load_batch(specs: &[FileSpec], rule: LabelRule) -> Vec<FileOutcome> {
    specs.par_iter().map(|spec| decode_file(spec, rule)).collect()
}

/// Start a batch on `session`, decode every file and merge the results.
pub fn load_into(
    session: &mut Session,
    specs: &[FileSpec],
    rule: LabelRule,
) -> Result<BatchReport, MergeError> {
    let ticket = session.begin_batch();
    let outcomes = load_batch(specs, rule);
    session.complete_batch(ticket, outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(SourceKind::detect(Path::new("a.XLSX")).unwrap(), SourceKind::Workbook);
        assert_eq!(SourceKind::detect(Path::new("a.ods")).unwrap(), SourceKind::Workbook);
        assert_eq!(SourceKind::detect(Path::new("a.csv")).unwrap(), SourceKind::Delimited(None));
        assert_eq!(SourceKind::detect(Path::new("a.tsv")).unwrap(), SourceKind::Delimited(Some(b'\t')));
        assert_eq!(
            SourceKind::detect(Path::new("a.pdf")).unwrap_err(),
            DecodeFailure::UnsupportedFormat("pdf".into())
        );
        assert!(SourceKind::detect(Path::new("README")).is_err());
    }

    #[test]
    fn test_labels_explicit_then_rule() {
        let spec = FileSpec::new("/data/desk1.csv");
        assert_eq!(spec.resolve_label(LabelRule::FilenameDigit), "Analyst 1");
        assert_eq!(spec.resolve_label(LabelRule::FileStem), "desk1");

        let spec = FileSpec::new("/data/other.csv");
        assert_eq!(spec.resolve_label(LabelRule::FilenameDigit), "Analyst 2");

        let spec = spec.with_label("Research");
        assert_eq!(spec.resolve_label(LabelRule::FilenameDigit), "Research");
    }

    #[test]
    fn test_outcomes_keep_file_order() {
        let dir = tempdir().unwrap();
        let mut specs = Vec::new();
        for i in 0..12 {
            let path = write(dir.path(), &format!("f{i:02}.csv"), &format!("Title\nItem {i}\n"));
            specs.push(FileSpec::new(path).with_label(format!("L{i}")));
        }

        let outcomes = load_batch(&specs, LabelRule::FilenameDigit);
        let labels: Vec<String> = outcomes.into_iter().map(|o| o.unwrap().label).collect();
        let expected: Vec<String> = (0..12).map(|i| format!("L{i}")).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_bad_file_does_not_sink_batch() {
        let dir = tempdir().unwrap();
        let good = write(dir.path(), "file2.csv", "Title,Company\nDeal,Acme\n");
        let specs = vec![
            FileSpec::new(dir.path().join("missing1.csv")),
            FileSpec::new(write(dir.path(), "notes.pdf", "%PDF")),
            FileSpec::new(good),
        ];

        let mut session = Session::default();
        let report = load_into(&mut session, &specs, LabelRule::FilenameDigit).unwrap();

        assert_eq!(report.files_loaded, 1);
        assert_eq!(report.decode_errors.len(), 2);
        assert_eq!(report.decode_errors[0].file, "missing1.csv");
        assert!(matches!(report.decode_errors[0].reason, DecodeFailure::Unreadable(_)));
        assert_eq!(report.decode_errors[1].reason, DecodeFailure::UnsupportedFormat("pdf".into()));
        assert_eq!(session.entries()[0].sources, vec!["Analyst 2"]);
    }

    #[test]
    fn test_merge_across_csv_files() {
        let dir = tempdir().unwrap();
        let specs = vec![
            FileSpec::new(write(dir.path(), "file1.csv", "Title,Notes,Company\nDeal A,Alpha,Acme\n")),
            FileSpec::new(write(dir.path(), "file2.csv", "Headline;Details;Sector\ndeal a ;Beta;Industrials\n")),
        ];

        let mut session = Session::default();
        load_into(&mut session, &specs, LabelRule::FilenameDigit).unwrap();

        let merged = &session.entries()[0];
        assert_eq!(session.entries().len(), 1);
        assert_eq!(merged.notes, "Alpha\n\nAnalyst 2: Beta");
        assert_eq!(merged.sources, vec!["Analyst 1", "Analyst 2"]);
        // first occurrence keeps its tags; the later sector is not merged in
        assert_eq!(merged.tags, vec!["Acme"]);
        assert_eq!(session.tags().labels(), &["Acme", "Industrials"]);
    }

    #[test]
    fn test_specs_from_manifest() {
        let config = BatchConfig::from_toml(
            r#"
[[files]]
path = "in/desk1.csv"

[[files]]
path = "/abs/morning.xlsx"
label = "Morning desk"
sheet = "News"
"#,
        )
        .unwrap();

        let specs = FileSpec::from_config(&config, Path::new("/work"));
        assert_eq!(specs[0].path, PathBuf::from("/work/in/desk1.csv"));
        assert_eq!(specs[0].label.as_deref(), Some("Analyst 1"));
        assert_eq!(specs[1].path, PathBuf::from("/abs/morning.xlsx"));
        assert_eq!(specs[1].label.as_deref(), Some("Morning desk"));
        assert_eq!(specs[1].sheet.as_deref(), Some("News"));
    }
}
