//! Image Compressor: lossy JPEG re-encode of a downloaded file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};

use crate::error::CompressError;
use crate::sanitize;
use crate::storage::ensure_directory;

#[derive(Debug, Clone, Copy)]
pub struct ImageCompressor {
    quality: u8,
}

impl ImageCompressor {
    /// `quality` is 0–100; the encoder floor is 1.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Re-encodes `input` to `output` on the blocking pool.
    pub async fn compress(&self, input: &Path, output: &Path) -> Result<PathBuf, CompressError> {
        let compressor = *self;
        let input = input.to_path_buf();
        let output = output.to_path_buf();
        tokio::task::spawn_blocking(move || compressor.compress_blocking(&input, &output))
            .await
            .map_err(|e| CompressError::Join(e.to_string()))?
    }

    pub fn compress_blocking(&self, input: &Path, output: &Path) -> Result<PathBuf, CompressError> {
        let _span = tracing::debug_span!("compress", quality = self.quality).entered();

        // Downloads carry a .jpg name whatever their real format, so sniff it.
        let reader = ImageReader::open(input)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| CompressError::Io {
                path: input.to_path_buf(),
                source: e,
            })?;
        let decoded = reader.decode().map_err(|e| CompressError::Decode {
            path: input.to_path_buf(),
            source: e,
        })?;

        if let Some(parent) = output.parent() {
            ensure_directory(parent)?;
        }

        let file = File::create(output).map_err(|e| CompressError::Io {
            path: output.to_path_buf(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        if let Err(e) = write_jpeg(&decoded, self.quality, &mut writer, output) {
            drop(writer);
            discard(output);
            return Err(e);
        }

        Ok(output.to_path_buf())
    }
}

/// Encodes `image` as JPEG into `writer` and flushes it. `path` only labels
/// errors.
fn write_jpeg<W: Write>(
    image: &DynamicImage,
    quality: u8,
    writer: &mut W,
    path: &Path,
) -> Result<(), CompressError> {
    let encoder = JpegEncoder::new_with_quality(&mut *writer, quality);
    image
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| CompressError::Encode {
            path: path.to_path_buf(),
            source: e,
        })?;
    writer.flush().map_err(|e| CompressError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Removes a partially written output.
fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            file = %sanitize::redact_path(path),
            "Failed to remove partial output: {}",
            e
        );
    }
}
