use std::fs::File;
use std::path::Path;

use super::{ProductRow, INPUT_IMAGE_URLS, PRODUCT_NAME};
use crate::error::CsvError;

const UTF8_BOM: char = '\u{feff}';

/// Reads every data row of the input spreadsheet, in file order.
///
/// Columns are located by header name. Field values are kept verbatim,
/// duplicates included. A missing `Product Name` or `Input Image Urls`
/// header is a structural error for the whole file.
pub fn read_rows(path: &Path) -> Result<Vec<ProductRow>, CsvError> {
    let file = File::open(path).map_err(|e| CsvError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches(UTF8_BOM) == name)
            .ok_or_else(|| CsvError::MissingColumn(name.to_string()))
    };
    let name_idx = position(PRODUCT_NAME)?;
    let urls_idx = position(INPUT_IMAGE_URLS)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(ProductRow {
            product_name: record.get(name_idx).map(str::to_string),
            input_urls: record.get(urls_idx).map(str::to_string),
            output_urls: String::new(),
        });
    }

    Ok(rows)
}
