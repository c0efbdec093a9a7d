//! Spreadsheet reading and writing.

pub mod reader;
pub mod writer;

pub use reader::read_rows;
pub use writer::{write_output, OUTPUT_HEADERS};

pub const PRODUCT_NAME: &str = "Product Name";
pub const INPUT_IMAGE_URLS: &str = "Input Image Urls";
pub const OUTPUT_IMAGE_URLS: &str = "Output Image Urls";

/// One product line of the spreadsheet, alive for a single job run.
///
/// Columns missing from a short record are `None`; the row validator decides
/// what that means for processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductRow {
    pub product_name: Option<String>,
    /// Raw comma-separated URL list, kept verbatim for the output file.
    pub input_urls: Option<String>,
    /// Comma-joined published URLs, empty until the row is processed.
    pub output_urls: String,
}

impl ProductRow {
    pub fn new(product_name: impl Into<String>, input_urls: impl Into<String>) -> Self {
        Self {
            product_name: Some(product_name.into()),
            input_urls: Some(input_urls.into()),
            output_urls: String::new(),
        }
    }

    /// Splits the input URL list on commas, trimming each entry. Empty
    /// entries (an empty field, a trailing comma) are not candidates.
    pub fn candidate_urls(&self) -> Vec<String> {
        match &self.input_urls {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_urls_are_trimmed_and_ordered() {
        let row = ProductRow::new("Chair", "http://a/x.jpg, not-a-url ,http://b/y.png");
        assert_eq!(
            row.candidate_urls(),
            vec!["http://a/x.jpg", "not-a-url", "http://b/y.png"]
        );
    }

    #[test]
    fn test_candidate_urls_keep_duplicates() {
        let row = ProductRow::new("Chair", "http://a/x.jpg,http://a/x.jpg");
        assert_eq!(row.candidate_urls().len(), 2);
    }

    #[test]
    fn test_empty_entries_skipped() {
        assert!(ProductRow::new("Chair", "").candidate_urls().is_empty());
        assert_eq!(
            ProductRow::new("Chair", "http://a/x.jpg, ,").candidate_urls(),
            vec!["http://a/x.jpg"]
        );
    }

    #[test]
    fn test_missing_url_column_yields_no_candidates() {
        let row = ProductRow {
            product_name: Some("Chair".to_string()),
            input_urls: None,
            output_urls: String::new(),
        };
        assert!(row.candidate_urls().is_empty());
    }
}
