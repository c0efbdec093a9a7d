use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::compress::ImageCompressor;
use crate::csv_io::ProductRow;
use crate::fetch::ImageFetcher;
use crate::sanitize;
use crate::slug::create_slug;
use crate::storage::StorageLayout;
use crate::validation::{is_valid_url, validate_row};

use super::context::{FailureReason, FailureRecord};

/// Result of processing one row.
#[derive(Debug, Default)]
pub struct RowOutcome {
    /// Published URLs in input order.
    pub output_urls: Vec<String>,
    pub failures: Vec<FailureRecord>,
}

impl RowOutcome {
    pub fn joined(&self) -> String {
        self.output_urls.join(",")
    }
}

/// Drives the URL Checker, Image Fetcher and Image Compressor for the URLs
/// of one row. Permits are shared process-wide through the semaphores.
#[derive(Clone)]
pub struct RowProcessor {
    layout: StorageLayout,
    fetcher: ImageFetcher,
    compressor: ImageCompressor,
    download_slots: Arc<Semaphore>,
    compress_slots: Arc<Semaphore>,
}

impl RowProcessor {
    pub fn new(
        layout: StorageLayout,
        fetcher: ImageFetcher,
        compressor: ImageCompressor,
        download_slots: Arc<Semaphore>,
        compress_slots: Arc<Semaphore>,
    ) -> Self {
        Self {
            layout,
            fetcher,
            compressor,
            download_slots,
            compress_slots,
        }
    }

    /// Storage namespace for a row. Names with no slug-able characters fall
    /// back to the row position.
    pub fn row_slug(product_name: &str, row_index: usize) -> String {
        let slug = create_slug(product_name);
        if slug.is_empty() {
            format!("row-{}", row_index)
        } else {
            slug
        }
    }

    pub async fn process(&self, job_id: &str, row_index: usize, row: &ProductRow) -> RowOutcome {
        let candidates = row.candidate_urls();
        let product_name = row.product_name.clone().unwrap_or_default();

        if let Err(issue) = validate_row(row) {
            tracing::warn!(job_id, row = row_index, "Skipping row: {}", issue);
            let failures = candidates
                .into_iter()
                .map(|url| {
                    FailureRecord::new(url, &product_name, FailureReason::InvalidRow, issue.to_string())
                })
                .collect();
            return RowOutcome {
                output_urls: Vec::new(),
                failures,
            };
        }

        let slug = Self::row_slug(&product_name, row_index);
        let span = tracing::info_span!("row", job_id, row = row_index, slug = %slug);
        self.process_valid(job_id, &slug, &product_name, candidates)
            .instrument(span)
            .await
    }

    async fn process_valid(
        &self,
        job_id: &str,
        slug: &str,
        product_name: &str,
        candidates: Vec<String>,
    ) -> RowOutcome {
        let mut failures = Vec::new();
        let mut published: Vec<Option<String>> = vec![None; candidates.len()];

        // Check and download every candidate, then wait for all of them.
        let download_dir = self.layout.downloads_dir(job_id, slug);
        let downloads = join_all(candidates.iter().enumerate().map(|(index, url)| {
            let download_dir = &download_dir;
            async move {
                if !is_valid_url(url) {
                    return (index, Err((FailureReason::InvalidUrl, "not an absolute URL".to_string())));
                }
                let _permit = match self.download_slots.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => return (index, Err((FailureReason::FetchFailed, e.to_string()))),
                };
                let result = self
                    .fetcher
                    .fetch(url, download_dir, job_id, index)
                    .await
                    .map_err(|e| (FailureReason::FetchFailed, e.to_string()));
                (index, result)
            }
        }))
        .await;

        let mut downloaded: Vec<(usize, PathBuf)> = Vec::new();
        for (index, result) in downloads {
            match result {
                Ok(path) => downloaded.push((index, path)),
                Err((reason, detail)) => {
                    tracing::warn!(
                        url = %sanitize::redact_url(&candidates[index]),
                        ?reason,
                        "{}",
                        detail
                    );
                    failures.push(FailureRecord::new(&candidates[index], product_name, reason, detail));
                }
            }
        }

        // Re-encode every downloaded file under the published tree.
        let processed_dir = self.layout.processed_dir(job_id, slug);
        let compressed = join_all(downloaded.iter().map(|(index, source)| {
            let processed_dir = &processed_dir;
            async move {
                let Some(file_name) = source.file_name() else {
                    return (*index, Err("download has no file name".to_string()));
                };
                let target = processed_dir.join(file_name);
                let _permit = match self.compress_slots.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => return (*index, Err(e.to_string())),
                };
                let result = self
                    .compressor
                    .compress(source, &target)
                    .await
                    .map(|written| {
                        let name = written
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        self.layout.image_url(job_id, slug, &name)
                    })
                    .map_err(|e| e.to_string());
                (*index, result)
            }
        }))
        .await;

        for (index, result) in compressed {
            match result {
                Ok(url) => published[index] = Some(url),
                Err(detail) => {
                    tracing::warn!(
                        url = %sanitize::redact_url(&candidates[index]),
                        "Compression failed: {}",
                        detail
                    );
                    failures.push(FailureRecord::new(
                        &candidates[index],
                        product_name,
                        FailureReason::CompressFailed,
                        detail,
                    ));
                }
            }
        }

        let output_urls: Vec<String> = published.into_iter().flatten().collect();
        tracing::debug!(
            published = output_urls.len(),
            failed = failures.len(),
            "Row processed"
        );

        RowOutcome {
            output_urls,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::http::{header, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use image::{ImageFormat, Rgb, RgbImage};
    use tempfile::TempDir;

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(16, 16, Rgb([200, 40, 40]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    async fn serve() -> String {
        let png = png_bytes();
        let router = Router::new()
            .route(
                "/a.png",
                get({
                    let png = png.clone();
                    move || async move { ([(header::CONTENT_TYPE, "image/png")], png) }
                }),
            )
            .route(
                "/b.png",
                get(move || async move { ([(header::CONTENT_TYPE, "image/png")], png) }),
            )
            .route("/garbage.jpg", get(|| async { "not an image" }))
            .route("/missing.jpg", get(|| async { StatusCode::NOT_FOUND }));
        bind(router).await
    }

    async fn bind(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn processor(root: &std::path::Path) -> RowProcessor {
        processor_with_slots(root, 2, 2)
    }

    fn processor_with_slots(root: &std::path::Path, downloads: usize, compressions: usize) -> RowProcessor {
        RowProcessor::new(
            StorageLayout::new(root, "http://cdn.test"),
            ImageFetcher::new(Some(Duration::from_secs(5))).unwrap(),
            ImageCompressor::new(50),
            Arc::new(Semaphore::new(downloads)),
            Arc::new(Semaphore::new(compressions)),
        )
    }

    #[test]
    fn test_row_slug_fallback() {
        assert_eq!(RowProcessor::row_slug("Red Shoes!", 0), "red-shoes");
        assert_eq!(RowProcessor::row_slug("!!!", 4), "row-4");
    }

    #[tokio::test]
    async fn test_invalid_url_recorded_and_valid_one_published() {
        let base = serve().await;
        let tmp = TempDir::new().unwrap();
        let row = ProductRow::new("Chair", format!("{}/a.png, not-a-url", base));

        let outcome = processor(tmp.path()).process("abc1234", 0, &row).await;

        assert_eq!(outcome.output_urls.len(), 1);
        assert!(outcome.output_urls[0].starts_with("http://cdn.test/process_images/abc1234/chair/abc1234-"));
        assert!(outcome.output_urls[0].ends_with("-0.jpg"));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].url, "not-a-url");
        assert_eq!(outcome.failures[0].reason, FailureReason::InvalidUrl);
        assert_eq!(outcome.failures[0].product_name, "Chair");
    }

    #[tokio::test]
    async fn test_output_keeps_input_order_and_skips_failures() {
        let base = serve().await;
        let tmp = TempDir::new().unwrap();
        let row = ProductRow::new(
            "Table",
            format!(
                "{b}/a.png,{b}/missing.jpg,{b}/garbage.jpg,{b}/b.png",
                b = base
            ),
        );

        let outcome = processor(tmp.path()).process("abc1234", 0, &row).await;

        assert_eq!(outcome.output_urls.len(), 2);
        assert!(outcome.output_urls[0].ends_with("-0.jpg"));
        assert!(outcome.output_urls[1].ends_with("-3.jpg"));

        let reasons: Vec<FailureReason> = outcome.failures.iter().map(|f| f.reason).collect();
        assert!(reasons.contains(&FailureReason::FetchFailed));
        assert!(reasons.contains(&FailureReason::CompressFailed));
        assert_eq!(outcome.failures.len(), 2);

        let published_dir = tmp.path().join("public/process_images/abc1234/table");
        assert_eq!(std::fs::read_dir(published_dir).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_row_records_every_url() {
        let tmp = TempDir::new().unwrap();
        let row = ProductRow {
            product_name: None,
            input_urls: Some("http://a/x.jpg, http://a/y.jpg".to_string()),
            output_urls: String::new(),
        };

        let outcome = processor(tmp.path()).process("abc1234", 2, &row).await;

        assert!(outcome.output_urls.is_empty());
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome
            .failures
            .iter()
            .all(|f| f.reason == FailureReason::InvalidRow));
        assert!(!tmp.path().join("downloads").exists());
    }

    #[tokio::test]
    async fn test_download_slots_bound_concurrent_fetches() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let png = png_bytes();
        let router = Router::new().route(
            "/slow.png",
            get({
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                move || {
                    let in_flight = in_flight.clone();
                    let peak = peak.clone();
                    let png = png.clone();
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(40)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        ([(header::CONTENT_TYPE, "image/png")], png)
                    }
                }
            }),
        );
        let base = bind(router).await;
        let tmp = TempDir::new().unwrap();
        let processor = processor_with_slots(tmp.path(), 1, 1);

        let urls = vec![format!("{}/slow.png", base); 4].join(",");
        let chair = ProductRow::new("Chair", urls.as_str());
        let table = ProductRow::new("Table", urls.as_str());

        // Two rows at once still share the single download slot.
        let (first, second) = tokio::join!(
            processor.process("abc1234", 0, &chair),
            processor.process("abc1234", 1, &table),
        );

        assert_eq!(first.output_urls.len(), 4);
        assert_eq!(second.output_urls.len(), 4);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_name_is_processed_under_row_slug() {
        let base = serve().await;
        let tmp = TempDir::new().unwrap();
        let processor = processor(tmp.path());
        let url = format!("{}/a.png", base);

        let blank = processor.process("abc1234", 1, &ProductRow::new("", url.as_str())).await;
        let punctuation = processor.process("abc1234", 2, &ProductRow::new("!!!", url.as_str())).await;

        assert!(blank.failures.is_empty());
        assert_eq!(blank.output_urls.len(), 1);
        assert!(blank.output_urls[0].starts_with("http://cdn.test/process_images/abc1234/row-1/"));
        assert!(punctuation.failures.is_empty());
        assert!(punctuation.output_urls[0].starts_with("http://cdn.test/process_images/abc1234/row-2/"));
    }

    #[tokio::test]
    async fn test_empty_url_field_yields_empty_output() {
        let tmp = TempDir::new().unwrap();
        let outcome = processor(tmp.path())
            .process("abc1234", 0, &ProductRow::new("Lamp", ""))
            .await;
        assert!(outcome.output_urls.is_empty());
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.joined(), "");
    }
}
