//! Caller-facing job operations: submit, status, download info.

use std::path::{Path, PathBuf};

use crate::db::{job_repo, Database};
use crate::error::{ImgbatchError, JobError, Result};
use crate::job::{generate_job_id, Job, JobStatus};
use crate::storage::StorageLayout;
use crate::validation::validate_csv_headers;

const MAX_ID_ATTEMPTS: u32 = 16;

/// A stored upload waiting to become a job.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub input_path: PathBuf,
    pub input_name: String,
    pub email: Option<String>,
    pub webhook_url: Option<String>,
}

impl SubmitRequest {
    pub fn new(input_path: impl Into<PathBuf>, input_name: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            input_name: input_name.into(),
            email: None,
            webhook_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadInfo {
    pub file_url: String,
    pub file_name: String,
}

#[derive(Clone)]
pub struct JobService {
    db: Database,
    layout: StorageLayout,
}

impl JobService {
    pub fn new(db: Database, layout: StorageLayout) -> Self {
        Self { db, layout }
    }

    /// Copies `source` into the uploads directory and submits it.
    pub fn submit_file(
        &self,
        source: &Path,
        email: Option<String>,
        webhook_url: Option<String>,
    ) -> Result<Job> {
        validate_csv_headers(source)?;
        let (stored, file_name) = self.layout.store_upload(source)?;
        self.submit(SubmitRequest {
            input_path: stored,
            input_name: file_name,
            email,
            webhook_url,
        })
    }

    /// Creates a PENDING job for an upload whose header row is valid.
    /// Rejected uploads never create a job.
    pub fn submit(&self, request: SubmitRequest) -> Result<Job> {
        validate_csv_headers(&request.input_path)?;

        let mut job = Job::new(request.input_name, request.input_path.display().to_string())
            .with_email(request.email)
            .with_webhook(request.webhook_url);
        job.id = self.unique_id()?;

        job_repo::insert(&self.db, &job)?;
        log::info!("Created job {} for {}", job.id, job.input_name);
        Ok(job)
    }

    pub fn status(&self, id: &str) -> Result<JobStatus> {
        Ok(self.find(id)?.status)
    }

    pub fn job(&self, id: &str) -> Result<Job> {
        self.find(id)
    }

    /// Where to fetch a finished job's output spreadsheet.
    pub fn download_info(&self, id: &str) -> Result<DownloadInfo> {
        let job = self.find(id)?;
        if job.status != JobStatus::Success {
            return Err(JobError::NotReady {
                id: job.id,
                status: job.status,
            }
            .into());
        }

        let relative = job
            .output_path
            .ok_or_else(|| JobError::OutputMissing(id.to_string()))?;
        if !self.layout.resolve_public(&relative).is_file() {
            return Err(JobError::OutputMissing(id.to_string()).into());
        }

        Ok(DownloadInfo {
            file_url: self.layout.public_url(&relative),
            file_name: job.input_name,
        })
    }

    fn find(&self, id: &str) -> Result<Job> {
        job_repo::find_by_id(&self.db, id)?
            .ok_or_else(|| ImgbatchError::from(JobError::NotFound(id.to_string())))
    }

    fn unique_id(&self) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_job_id();
            if !job_repo::exists(&self.db, &id)? {
                return Ok(id);
            }
        }
        Err(JobError::IdExhausted(MAX_ID_ATTEMPTS).into())
    }
}
