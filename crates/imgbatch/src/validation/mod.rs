//! Checks applied before and during a job run.

pub mod csv_header;
pub mod row;
pub mod url;

pub use csv_header::{validate_csv_headers, EXPECTED_HEADERS};
pub use row::{validate_row, RowIssue};
pub use url::is_valid_url;
