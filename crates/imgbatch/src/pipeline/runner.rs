use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{error, info, info_span, warn, Instrument};

use crate::compress::ImageCompressor;
use crate::config::Config;
use crate::csv_io::{read_rows, write_output};
use crate::db::{job_repo, Database};
use crate::error::ImgbatchError;
use crate::fetch::ImageFetcher;
use crate::job::{Job, JobStatus};
use crate::notify::Webhook;
use crate::sanitize;
use crate::storage::StorageLayout;

use super::context::{FailureLog, RunReport};
use super::error::RunError;
use super::row::RowProcessor;

/// Runs one job end to end: PROCESSING, rows, output file, final status,
/// webhook.
#[derive(Clone)]
pub struct JobRunner {
    db: Database,
    layout: StorageLayout,
    rows: RowProcessor,
    webhook: Webhook,
}

impl JobRunner {
    /// Production constructor. The download and compression semaphores
    /// built here are shared by every clone of the runner.
    pub fn from_config(config: &Config, db: Database) -> Result<Self, ImgbatchError> {
        let layout = StorageLayout::new(config.storage_root(), &config.public_base_url);
        let fetcher = ImageFetcher::new(config.http.connect_timeout())?;
        let compressor = ImageCompressor::new(config.compression.quality);
        let rows = RowProcessor::new(
            layout.clone(),
            fetcher,
            compressor,
            Arc::new(Semaphore::new(config.concurrency.downloads)),
            Arc::new(Semaphore::new(config.concurrency.compressions)),
        );
        let webhook = Webhook::new(Duration::from_secs(config.webhook.timeout_secs))?;

        Ok(Self::new(db, layout, rows, webhook))
    }

    pub fn new(db: Database, layout: StorageLayout, rows: RowProcessor, webhook: Webhook) -> Self {
        Self {
            db,
            layout,
            rows,
            webhook,
        }
    }

    /// Processes `job`, which must be PENDING.
    ///
    /// Structural failures (unreadable input, unwritable output) persist the
    /// job as FAILED and are returned as errors. Per-URL failures end up in
    /// the report and the job's `errors` field instead.
    pub async fn run(&self, job: Job) -> Result<RunReport, RunError> {
        let span = info_span!("job",
            job_id = %job.id,
            input = %sanitize::redact_path(Path::new(&job.input_path)),
        );
        self.run_inner(job).instrument(span).await
    }

    async fn run_inner(&self, mut job: Job) -> Result<RunReport, RunError> {
        job.transition(JobStatus::Processing)?;
        job_repo::update(&self.db, &job)?;
        info!("Processing {}", job.input_name);

        let outcome = match self.process_rows(&job).await {
            Ok(report) => report
                .failures
                .to_json()
                .map(|errors| (report, errors))
                .map_err(RunError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((report, errors)) => {
                job.output_path = Some(report.output_relative.clone());
                job.errors = errors;
                job.message = Some(report.summary());
                job.transition(JobStatus::Success)?;
                job_repo::update(&self.db, &job)?;
                info!("{}", report.summary());

                if let Some(url) = job.webhook_url.as_deref() {
                    if let Err(e) = self.webhook.notify(url, &job.id).await {
                        warn!(url = %sanitize::redact_url(url), "Webhook failed: {}", e);
                    }
                }
                Ok(report)
            }
            Err(e) if e.is_structural() => {
                error!("Job failed: {}", e);
                job.message = Some(e.to_string());
                job.transition(JobStatus::Failed)?;
                job_repo::update(&self.db, &job)?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn process_rows(&self, job: &Job) -> Result<RunReport, RunError> {
        let mut rows = read_rows(Path::new(&job.input_path)).map_err(RunError::Input)?;

        let mut failures = FailureLog::new();
        let mut images_published = 0;
        for (index, row) in rows.iter_mut().enumerate() {
            let outcome = self.rows.process(&job.id, index, row).await;
            row.output_urls = outcome.joined();
            images_published += outcome.output_urls.len();
            failures.extend(outcome.failures);
        }

        let written = write_output(&self.layout, &job.id, &rows).map_err(RunError::Output)?;

        Ok(RunReport {
            job_id: job.id.clone(),
            rows_processed: rows.len(),
            images_published,
            failures,
            output_path: written.path,
            output_relative: written.relative,
        })
    }
}
