use std::path::PathBuf;

use super::{ProductRow, INPUT_IMAGE_URLS, OUTPUT_IMAGE_URLS, PRODUCT_NAME};
use crate::error::CsvError;
use crate::storage::{ensure_directory, StorageLayout};

pub const OUTPUT_HEADERS: [&str; 3] = [PRODUCT_NAME, INPUT_IMAGE_URLS, OUTPUT_IMAGE_URLS];

/// Location of a written output spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenOutput {
    pub path: PathBuf,
    /// Path relative to the published root, as stored on the job.
    pub relative: String,
}

/// Writes the processed rows to `public/csv_output/{job}/{job}.csv`,
/// replacing any previous file for the same job.
pub fn write_output(
    layout: &StorageLayout,
    job_id: &str,
    rows: &[ProductRow],
) -> Result<WrittenOutput, CsvError> {
    let path = layout.csv_output_path(job_id);
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let write_err = |source: csv::Error| CsvError::Write {
        path: path.clone(),
        source,
    };

    let mut writer = csv::Writer::from_path(&path).map_err(write_err)?;
    writer.write_record(OUTPUT_HEADERS).map_err(write_err)?;
    for row in rows {
        writer
            .write_record([
                row.product_name.as_deref().unwrap_or(""),
                row.input_urls.as_deref().unwrap_or(""),
                row.output_urls.as_str(),
            ])
            .map_err(write_err)?;
    }
    writer.flush().map_err(|e| write_err(e.into()))?;

    let relative = layout.public_relative(&path)?;
    Ok(WrittenOutput { path, relative })
}
