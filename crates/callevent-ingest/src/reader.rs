//! CSV reading for inbound files

use std::path::Path;
use tracing::warn;

/// Read every row of `path` as raw string fields, header included
///
/// Failing to open the file is an error. A single malformed record is logged
/// and skipped so the rest of the file can still be validated.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        match record {
            Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
            Err(e) => warn!(
                file = %path.display(),
                line = index + 1,
                error = %e,
                "Skipping unreadable CSV record"
            ),
        }
    }

    Ok(rows)
}
