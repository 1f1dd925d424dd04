// File I/O: spreadsheet decoding, batch loading, export

pub mod batch;
pub mod csv;
pub mod export;
pub mod json;
mod rows;
pub mod xlsx;

pub use batch::{decode_file, load_batch, load_into, FileSpec, SourceKind};
pub use export::{export_entries, ExportFormat};
