//! Test harness for isolated job runs.
//!
//! Every harness owns a temporary storage root and an in-memory job store;
//! runner, service and scheduler are all built from the same config the
//! binary would use.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use imgbatch::config::Config;
use imgbatch::db::job_repo;
use imgbatch::{Database, Job, JobRunner, JobService, Scheduler, StorageLayout};

pub const PUBLIC_BASE_URL: &str = "http://cdn.test";

pub struct TestHarness {
    temp_dir: TempDir,
    pub config: Config,
    pub db: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config {
            storage_root: temp_dir.path().display().to_string(),
            public_base_url: PUBLIC_BASE_URL.to_string(),
            ..Config::default()
        };
        let db = Database::open_in_memory().expect("Failed to open database");

        Self {
            temp_dir,
            config,
            db,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(self.config.storage_root(), &self.config.public_base_url)
    }

    pub fn runner(&self) -> JobRunner {
        JobRunner::from_config(&self.config, self.db.clone()).expect("Failed to build runner")
    }

    pub fn service(&self) -> JobService {
        JobService::new(self.db.clone(), self.layout())
    }

    pub fn scheduler(&self, interval: Duration) -> Scheduler {
        Scheduler::new(self.runner(), self.db.clone(), interval)
    }

    /// Writes a spreadsheet with the standard header and the given
    /// `(product name, url list)` rows.
    pub fn write_csv(&self, filename: &str, rows: &[(&str, &str)]) -> PathBuf {
        let path = self.root().join(filename);
        let mut writer = csv::Writer::from_path(&path).expect("Failed to create CSV");
        writer
            .write_record(["S. No.", "Product Name", "Input Image Urls"])
            .expect("Failed to write header");
        for (i, &(name, urls)) in rows.iter().enumerate() {
            let serial = (i + 1).to_string();
            writer
                .write_record([serial.as_str(), name, urls])
                .expect("Failed to write row");
        }
        writer.flush().expect("Failed to flush CSV");
        path
    }

    /// Submits a spreadsheet through the service, as the CLI does: the file
    /// is copied into `uploads/` under a unique name first.
    pub fn submit(&self, rows: &[(&str, &str)], webhook_url: Option<String>) -> Job {
        let path = self.write_csv("products.csv", rows);
        self.service()
            .submit_file(&path, None, webhook_url)
            .expect("Failed to submit job")
    }

    pub fn reload(&self, job: &Job) -> Job {
        job_repo::find_by_id(&self.db, &job.id)
            .expect("Failed to query job")
            .expect("Job disappeared")
    }

    /// Reads the output spreadsheet of a finished job as
    /// `(product name, input urls, output urls)` rows.
    pub fn read_output(&self, job: &Job) -> Vec<(String, String, String)> {
        let relative = job.output_path.as_deref().expect("Job has no output path");
        let path = self.layout().resolve_public(relative);
        let mut reader = csv::Reader::from_path(&path).expect("Failed to open output CSV");
        let headers: Vec<String> = reader
            .headers()
            .expect("Output has no header")
            .iter()
            .map(String::from)
            .collect();
        assert_eq!(headers, ["Product Name", "Input Image Urls", "Output Image Urls"]);
        reader
            .records()
            .map(|r| {
                let r = r.expect("Bad output record");
                (r[0].to_string(), r[1].to_string(), r[2].to_string())
            })
            .collect()
    }

    /// Maps a published image URL back to its file under `public/`.
    pub fn published_file(&self, url: &str) -> PathBuf {
        let relative = url
            .strip_prefix(PUBLIC_BASE_URL)
            .expect("URL not under the public base");
        self.layout().resolve_public(relative)
    }
}
