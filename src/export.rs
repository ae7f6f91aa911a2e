use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::HarvestError;
use crate::results::{COLUMNS, OutputRecord};

/// Write records as CSV, header first, columns in the fixed export order
pub fn write_records<W: Write>(writer: W, records: &[OutputRecord]) -> Result<(), HarvestError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(COLUMNS)?;
    for record in records {
        csv_writer.write_record(record.to_row())?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export records to `path`.
///
/// The table is written to a temporary sibling first and renamed into place,
/// so a reader never sees a half-written file.
pub fn export_csv<P: AsRef<Path>>(path: P, records: &[OutputRecord]) -> Result<(), HarvestError> {
    let path = path.as_ref();
    let staging = staging_path(path);

    let result = File::create(&staging)
        .map_err(HarvestError::from)
        .and_then(|file| write_records(file, records))
        .and_then(|()| fs::rename(&staging, path).map_err(HarvestError::from));

    if let Err(e) = result {
        ::log::error!("Failed to export data to {}: {}", path.display(), e);
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    ::log::info!(
        "Successfully exported {} records to {}",
        records.len(),
        path.display()
    );
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export.csv".to_string());
    path.with_file_name(format!(".{}.partial", name))
}
