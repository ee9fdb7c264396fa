use crate::error::Result;
use crate::observability::metrics;
use crate::types::CleanRecord;
use std::fs;
use std::path::Path;
use tracing::info;

/// Writes `records` as CSV with a header row, replacing any existing file.
/// Row order follows `records`; missing values become empty cells.
pub fn write_table(records: &[CleanRecord], destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(destination)?;
    if records.is_empty() {
        // serde only emits the header along with the first row
        writer.write_record(crate::constants::CLEAN_COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    metrics::clean::rows_written(records.len());
    info!("Wrote {} rows to {}", records.len(), destination.display());
    Ok(())
}

/// Reads a table written by `write_table`
pub fn read_table(source: &Path) -> Result<Vec<CleanRecord>> {
    let mut reader = csv::Reader::from_path(source)?;
    let records = reader
        .deserialize::<CleanRecord>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    Ok(records)
}
