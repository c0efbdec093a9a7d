use thiserror::Error;

/// Failures that stop a job run. Per-URL problems never surface here; they
/// are collected in the run's failure log instead.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to read input spreadsheet: {0}")]
    Input(crate::error::CsvError),

    #[error("Failed to write output spreadsheet: {0}")]
    Output(crate::error::CsvError),

    #[error("Failed to encode failure list: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Job store failed: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error(transparent)]
    Job(#[from] crate::error::JobError),
}

impl RunError {
    /// Structural errors fail the job; store errors leave it untouched.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RunError::Input(_) | RunError::Output(_) | RunError::Serialize(_)
        )
    }
}
