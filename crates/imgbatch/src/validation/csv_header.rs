use std::fs::File;
use std::path::Path;

use crate::error::CsvError;

/// Header row every uploaded spreadsheet must carry, in this order.
pub const EXPECTED_HEADERS: [&str; 3] = ["S. No.", "Product Name", "Input Image Urls"];

const UTF8_BOM: char = '\u{feff}';

/// Checks that the file's header row is exactly [`EXPECTED_HEADERS`].
///
/// Only the header shape is inspected; data rows are not read.
pub fn validate_csv_headers(path: &Path) -> Result<(), CsvError> {
    let file = File::open(path).map_err(|e| CsvError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut header = csv::StringRecord::new();
    if !reader.read_record(&mut header)? {
        return Err(CsvError::Empty(path.to_path_buf()));
    }

    let found: Vec<&str> = header
        .iter()
        .enumerate()
        .map(|(i, h)| if i == 0 { h.trim_start_matches(UTF8_BOM) } else { h })
        .collect();

    if found != EXPECTED_HEADERS {
        return Err(CsvError::HeaderMismatch {
            expected: EXPECTED_HEADERS.join(", "),
            found: found.join(", "),
        });
    }

    Ok(())
}
