// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use newsmerge_core::MergedEntry;

/// Export entries as a JSON array of merged-entry objects
pub fn export(entries: &[&MergedEntry], path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, entries).map_err(|e| e.to_string())?;
    Ok(())
}
