//! On-disk layout under the storage root.
//!
//! ```text
//! {root}/uploads/{upload}.csv
//! {root}/downloads/{job}/{slug}/{job}-{millis}-{index}.jpg
//! {root}/public/process_images/{job}/{slug}/{file}
//! {root}/public/csv_output/{job}/{job}.csv
//! ```
//!
//! `public/` is served externally at `public_base_url`.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use rand::Rng;

use crate::error::StorageError;

const DOWNLOADS_DIR: &str = "downloads";
const UPLOADS_DIR: &str = "uploads";
const PUBLIC_DIR: &str = "public";
const PROCESSED_DIR: &str = "process_images";
const CSV_OUTPUT_DIR: &str = "csv_output";

/// Creates `path` and its parents if missing.
pub fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
    public_base_url: String,
}

impl StorageLayout {
    pub fn new<P: AsRef<Path>>(root: P, public_base_url: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_root(&self) -> PathBuf {
        self.root.join(PUBLIC_DIR)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    pub fn downloads_dir(&self, job_id: &str, slug: &str) -> PathBuf {
        self.root.join(DOWNLOADS_DIR).join(job_id).join(slug)
    }

    pub fn processed_dir(&self, job_id: &str, slug: &str) -> PathBuf {
        self.public_root()
            .join(PROCESSED_DIR)
            .join(job_id)
            .join(slug)
    }

    pub fn csv_output_path(&self, job_id: &str) -> PathBuf {
        self.public_root()
            .join(CSV_OUTPUT_DIR)
            .join(job_id)
            .join(format!("{}.csv", job_id))
    }

    /// Path of `path` relative to `public/`, with `/` separators.
    pub fn public_relative(&self, path: &Path) -> Result<String, StorageError> {
        let public_root = self.public_root();
        let relative = path
            .strip_prefix(&public_root)
            .map_err(|_| StorageError::OutsidePublicRoot {
                path: path.to_path_buf(),
                root: public_root.clone(),
            })?;

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                _ => {
                    return Err(StorageError::OutsidePublicRoot {
                        path: path.to_path_buf(),
                        root: public_root,
                    })
                }
            }
        }
        Ok(parts.join("/"))
    }

    /// Resolves a stored public-relative path back to its location on disk.
    pub fn resolve_public(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|p| !p.is_empty())
            .fold(self.public_root(), |acc, part| acc.join(part))
    }

    /// Caller-facing URL for a file under `public/`.
    pub fn public_url(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url,
            relative.trim_start_matches('/')
        )
    }

    /// Published address of one compressed image.
    pub fn image_url(&self, job_id: &str, slug: &str, file_name: &str) -> String {
        self.public_url(&format!(
            "{}/{}/{}/{}",
            PROCESSED_DIR, job_id, slug, file_name
        ))
    }

    /// Copies an uploaded spreadsheet into `uploads/` under a collision-free
    /// name. Returns the stored path and its file name.
    pub fn store_upload(&self, source: &Path) -> Result<(PathBuf, String), StorageError> {
        let uploads = self.uploads_dir();
        ensure_directory(&uploads)?;

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("upload");
        let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
        let file_name = format!("{}-{}-{}.csv", stem, Utc::now().timestamp_millis(), suffix);
        let destination = uploads.join(&file_name);

        std::fs::copy(source, &destination).map_err(|e| StorageError::CopyFile {
            from: source.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;

        Ok((destination, file_name))
    }
}
