pub mod compress;
pub mod config;
pub mod csv_io;
pub mod db;
pub mod error;
pub mod fetch;
pub mod job;
pub mod logging;
pub mod notify;
pub mod pipeline;
pub mod sanitize;
pub mod scheduler;
pub mod service;
pub mod slug;
pub mod storage;
pub mod validation;

pub use config::{load_config, load_with_env, Config};
pub use db::{Database, DatabaseError};
pub use error::{
    CompressError, ConfigError, CsvError, FetchError, ImgbatchError, JobError, Result,
    StorageError, WebhookError,
};
pub use job::{Job, JobStatus};
pub use pipeline::{FailureRecord, JobRunner, RunError, RunReport};
pub use scheduler::{Scheduler, TickOutcome};
pub use service::{DownloadInfo, JobService, SubmitRequest};
pub use storage::StorageLayout;
