use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidUrl,
    FetchFailed,
    CompressFailed,
    InvalidRow,
}

/// A URL excluded from its row's output list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub url: String,
    pub product_name: String,
    pub reason: FailureReason,
    pub detail: String,
}

impl FailureRecord {
    pub fn new(
        url: impl Into<String>,
        product_name: impl Into<String>,
        reason: FailureReason,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            product_name: product_name.into(),
            reason,
            detail: detail.into(),
        }
    }
}

/// Failures accumulated over one job run. Owned by that run only, so
/// consecutive jobs never see each other's records.
#[derive(Debug, Clone, Default)]
pub struct FailureLog {
    records: Vec<FailureRecord>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = FailureRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[FailureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The job's persisted `errors` value: a JSON array, or "" when empty.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        if self.records.is_empty() {
            return Ok(String::new());
        }
        serde_json::to_string(&self.records)
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub job_id: String,
    pub rows_processed: usize,
    pub images_published: usize,
    pub failures: FailureLog,
    pub output_path: PathBuf,
    /// Output path relative to the published root.
    pub output_relative: String,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "Processed {} rows, published {} images, {} failures",
            self.rows_processed,
            self.images_published,
            self.failures.len()
        )
    }
}
