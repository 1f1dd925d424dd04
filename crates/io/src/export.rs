// Export of merged entries, dispatched on the output file's extension

use std::fmt;
use std::path::Path;

use newsmerge_core::MergedEntry;

pub const EXPORT_HEADERS: [&str; 5] = ["Title", "Notes", "Company", "Sector", "Sources"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Xlsx => write!(f, "xlsx"),
        }
    }
}

/// One export row, in `EXPORT_HEADERS` order.
pub(crate) fn export_record(entry: &MergedEntry) -> [String; 5] {
    [
        entry.title.clone(),
        entry.notes.clone(),
        entry.company.clone(),
        entry.sector.clone(),
        entry.sources_line(),
    ]
}

/// Write `entries` to `path` in the format its extension names.
pub fn export_entries(entries: &[&MergedEntry], path: &Path) -> Result<ExportFormat, String> {
    let format = ExportFormat::from_path(path).ok_or_else(|| {
        format!(
            "cannot export to '{}': use a .json, .csv or .xlsx file",
            path.display()
        )
    })?;

    match format {
        ExportFormat::Json => crate::json::export(entries, path)?,
        ExportFormat::Csv => crate::csv::export(entries, path)?,
        ExportFormat::Xlsx => crate::xlsx::export(entries, path)?,
    }
    log::info!("exported {} entries to {} ({format})", entries.len(), path.display());
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use newsmerge_core::{deduplicate, Entry};

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out.JSON")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path(Path::new("a/b.csv")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("merged.xlsx")), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_path(Path::new("merged.ods")), None);
        assert_eq!(ExportFormat::from_path(Path::new("merged")), None);
    }

    #[test]
    fn test_unknown_extension_is_rejected_before_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let err = export_entries(&[], &path).unwrap_err();
        assert!(err.contains(".json, .csv or .xlsx"));
        assert!(!path.exists());
    }

    #[test]
    fn test_dispatch_writes_file() {
        let dir = tempdir().unwrap();
        let merged = deduplicate(vec![Entry::new("Deal", "", "Acme", "", "Analyst 1")]);
        let refs: Vec<&MergedEntry> = merged.iter().collect();

        for name in ["out.json", "out.csv", "out.xlsx"] {
            let path = dir.path().join(name);
            export_entries(&refs, &path).unwrap();
            assert!(path.exists(), "{name} not written");
        }
    }
}
