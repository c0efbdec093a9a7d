use std::path::PathBuf;
use thiserror::Error;

use crate::job::JobStatus;

#[derive(Error, Debug)]
pub enum ImgbatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Run error: {0}")]
    Run(#[from] crate::pipeline::RunError),

    #[error("Failed to {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid value for environment variable '{name}': {value}")]
    InvalidEnv { name: String, value: String },
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("Failed to open CSV file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] csv::Error),

    #[error("CSV file '{0}' has no header row")]
    Empty(PathBuf),

    #[error("Invalid CSV headers: expected [{expected}], found [{found}]")]
    HeaderMismatch { expected: String, found: String },

    #[error("CSV is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Failed to write CSV file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy file from '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path '{path}' is outside the published root '{root}'")]
    OutsidePublicRoot { path: PathBuf, root: PathBuf },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to write download '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write compressed image '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Compression task aborted: {0}")]
    Join(String),
}

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook responded with status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Invalid status transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Unknown job status '{0}'")]
    UnknownStatus(String),

    #[error("No job found with id '{0}'")]
    NotFound(String),

    #[error("Job {id} is not ready for download (status {status})")]
    NotReady { id: String, status: JobStatus },

    #[error("Output file for job {0} is missing")]
    OutputMissing(String),

    #[error("Could not allocate a unique job id after {0} attempts")]
    IdExhausted(u32),
}

pub type Result<T> = std::result::Result<T, ImgbatchError>;
