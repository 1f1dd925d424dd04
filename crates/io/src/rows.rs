// Header row + records -> RawRow maps, shared by the csv and workbook decoders.

use newsmerge_core::RawRow;

/// Key each record by the header row.
///
/// Missing trailing cells become `""`, cells past the last header are
/// dropped, blank headers are skipped and a repeated header keeps its first
/// column. Records with no non-empty cell at all are skipped.
pub(crate) fn assemble<I>(headers: &[String], records: I) -> Vec<RawRow>
where
    I: IntoIterator<Item = Vec<String>>,
{
    records
        .into_iter()
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .map(|cells| {
            let mut row = RawRow::with_capacity(headers.len());
            for (i, header) in headers.iter().enumerate() {
                if header.is_empty() || row.contains_key(header) {
                    continue;
                }
                row.insert(header.clone(), cells.get(i).cloned().unwrap_or_default());
            }
            row
        })
        .collect()
}
