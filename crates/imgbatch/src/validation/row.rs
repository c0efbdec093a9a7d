use std::fmt;

use crate::csv_io::ProductRow;

/// Why a spreadsheet row cannot be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowIssue {
    MissingProductName,
    MissingImageUrls,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssue::MissingProductName => write!(f, "row has no Product Name field"),
            RowIssue::MissingImageUrls => write!(f, "row has no Input Image Urls field"),
        }
    }
}

/// A row is processable when it carries both required columns. Empty values
/// are allowed: a blank name gets a positional slug, an empty URL field
/// yields no images.
pub fn validate_row(row: &ProductRow) -> Result<(), RowIssue> {
    if row.product_name.is_none() {
        return Err(RowIssue::MissingProductName);
    }
    if row.input_urls.is_none() {
        return Err(RowIssue::MissingImageUrls);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_row_is_valid() {
        assert!(validate_row(&ProductRow::new("Chair", "http://a/x.jpg")).is_ok());
    }

    #[test]
    fn test_empty_url_field_is_valid() {
        assert!(validate_row(&ProductRow::new("Chair", "")).is_ok());
    }

    #[test]
    fn test_blank_product_name_is_valid() {
        assert!(validate_row(&ProductRow::new("", "http://a/x.jpg")).is_ok());
        assert!(validate_row(&ProductRow::new("   ", "http://a/x.jpg")).is_ok());
    }

    #[test]
    fn test_missing_columns() {
        let no_name = ProductRow {
            product_name: None,
            input_urls: Some("http://a/x.jpg".to_string()),
            output_urls: String::new(),
        };
        assert_eq!(validate_row(&no_name), Err(RowIssue::MissingProductName));

        let no_urls = ProductRow {
            product_name: Some("Chair".to_string()),
            input_urls: None,
            output_urls: String::new(),
        };
        assert_eq!(validate_row(&no_urls), Err(RowIssue::MissingImageUrls));
    }
}
