use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::HarvestError;
use crate::results::LookupRequest;

/// Cell values treated the same as an empty cell
const MISSING_MARKERS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

/// Load lookup requests from a CSV file.
///
/// The first row is a header. Columns are read by position: reference, surname,
/// secondary code. Any further columns are ignored.
pub fn load_requests<P: AsRef<Path>>(path: P) -> Result<Vec<LookupRequest>, HarvestError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        HarvestError::Validation(format!("cannot open {}: {}", path.display(), e))
    })?;

    let requests = read_requests(file)?;
    ::log::info!(
        "Loaded {} booking records from {}",
        requests.len(),
        path.display()
    );
    Ok(requests)
}

/// Read lookup requests from any CSV source
pub fn read_requests<R: Read>(reader: R) -> Result<Vec<LookupRequest>, HarvestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = csv_reader.headers()?.len();
    if columns < 3 {
        return Err(HarvestError::Validation(format!(
            "expected at least 3 columns (reference, surname, secondary code), found {}",
            columns
        )));
    }

    let mut requests = Vec::new();
    for (row, result) in csv_reader.records().enumerate() {
        let record = result?;

        let reference = cell(&record, 0);
        let surname = cell(&record, 1);
        let (Some(reference), Some(surname)) = (reference, surname) else {
            ::log::debug!("Skipping input row {}: missing reference or surname", row + 1);
            continue;
        };
        let secondary_code = cell(&record, 2).unwrap_or_default();

        requests.push(LookupRequest::new(reference, surname, secondary_code));
    }

    Ok(requests)
}

/// Trimmed cell value, or `None` when absent or a missing-value marker
fn cell(record: &csv::StringRecord, index: usize) -> Option<&str> {
    let value = record.get(index)?.trim();
    if is_missing(value) { None } else { Some(value) }
}

fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value)
}
