//! Image Fetcher: downloads one remote image into a per-row directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::FetchError;
use crate::sanitize;
use crate::storage::ensure_directory;

const MAX_NAME_ATTEMPTS: i64 = 1000;

#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    /// Builds the shared download client. Without `connect_timeout` the
    /// transport defaults apply.
    pub fn new(connect_timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Name of the downloaded file for the URL at `index` in a row.
    pub fn file_name(job_id: &str, millis: i64, index: usize) -> String {
        format!("{}-{}-{}.jpg", job_id, millis, index)
    }

    /// Streams `url` into `dest_dir`. On any failure the partial file is
    /// removed and nothing is left behind.
    pub async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        job_id: &str,
        index: usize,
    ) -> Result<PathBuf, FetchError> {
        ensure_directory(dest_dir)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let (path, file) = create_unique(dest_dir, job_id, index).await?;
        match write_body(response, file, &path).await {
            Ok(bytes) => {
                tracing::debug!(
                    url = %sanitize::redact_url(url),
                    file = %sanitize::redact_path(&path),
                    bytes,
                    "Downloaded image"
                );
                Ok(path)
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(
                        file = %sanitize::redact_path(&path),
                        "Failed to remove partial download: {}",
                        remove_err
                    );
                }
                Err(e)
            }
        }
    }
}

/// Creates a new download file. Rows that share a slug write into the same
/// directory, so a name already taken moves on to the next millisecond.
async fn create_unique(
    dest_dir: &Path,
    job_id: &str,
    index: usize,
) -> Result<(PathBuf, tokio::fs::File), FetchError> {
    let start = Utc::now().timestamp_millis();
    let mut millis = start;
    loop {
        let path = dest_dir.join(ImageFetcher::file_name(job_id, millis, index));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e)
                if e.kind() == std::io::ErrorKind::AlreadyExists
                    && millis - start < MAX_NAME_ATTEMPTS =>
            {
                millis += 1;
            }
            Err(e) => return Err(FetchError::Io { path, source: e }),
        }
    }
}

async fn write_body(
    response: reqwest::Response,
    mut file: tokio::fs::File,
    path: &Path,
) -> Result<u64, FetchError> {
    let io_err = |source: std::io::Error| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_err)?;

    Ok(written)
}
