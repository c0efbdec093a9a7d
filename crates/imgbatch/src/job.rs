//! Job record and its status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// Length of generated job ids.
pub const JOB_ID_LEN: usize = 7;

/// Lifecycle of a job: `Pending -> Processing -> {Success, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }

    /// Transitions are one-directional; nothing re-enters `Pending`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Success)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "PROCESSING" => Ok(JobStatus::Processing),
            "SUCCESS" => Ok(JobStatus::Success),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(JobError::UnknownStatus(other.to_string())),
        }
    }
}

/// One submitted spreadsheet processing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub email: Option<String>,
    pub status: JobStatus,
    /// Name of the uploaded CSV as stored on disk.
    pub input_name: String,
    pub input_path: String,
    /// Output CSV path relative to the published root, set on success.
    pub output_path: Option<String>,
    /// JSON array of failure records, empty string when there were none.
    pub errors: String,
    pub webhook_url: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a new `Pending` job with a freshly generated id.
    pub fn new(input_name: impl Into<String>, input_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_job_id(),
            email: None,
            status: JobStatus::Pending,
            input_name: input_name.into(),
            input_path: input_path.into(),
            output_path: None,
            errors: String::new(),
            webhook_url: None,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    pub fn with_webhook(mut self, webhook_url: Option<String>) -> Self {
        self.webhook_url = webhook_url;
        self
    }

    /// Moves the job to `next`, refusing any transition the state machine forbids.
    pub fn transition(&mut self, next: JobStatus) -> Result<(), JobError> {
        if !self.status.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Generates a short random alphanumeric token.
pub fn generate_job_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(JOB_ID_LEN)
        .map(char::from)
        .collect()
}
