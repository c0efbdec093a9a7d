//! Local HTTP server standing in for remote image hosts.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use image::{ImageFormat, Rgb, RgbImage};

pub struct ImageServer {
    pub base_url: String,
    webhook_hits: Arc<AtomicUsize>,
}

/// Encodes a small solid-color image in `format`.
pub fn image_bytes(color: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(32, 24, Rgb(color));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("Failed to encode test image");
    buf.into_inner()
}

impl ImageServer {
    /// Binds `127.0.0.1:0` and serves:
    /// - `GET /red.png`, `GET /blue.png`: valid PNG images
    /// - `GET /photo.jpg`: a valid JPEG image
    /// - `GET /garbage.jpg`: 200 with a body that is not an image
    /// - `POST /hook`: counts calls
    /// Anything else is a 404.
    pub async fn start() -> Self {
        let red = image_bytes([220, 30, 30], ImageFormat::Png);
        let blue = image_bytes([30, 30, 220], ImageFormat::Png);
        let photo = image_bytes([30, 200, 30], ImageFormat::Jpeg);
        let webhook_hits = Arc::new(AtomicUsize::new(0));
        let hits = webhook_hits.clone();

        let router = Router::new()
            .route(
                "/red.png",
                get(move || async move { ([(header::CONTENT_TYPE, "image/png")], red) }),
            )
            .route(
                "/blue.png",
                get(move || async move { ([(header::CONTENT_TYPE, "image/png")], blue) }),
            )
            .route(
                "/photo.jpg",
                get(move || async move { ([(header::CONTENT_TYPE, "image/jpeg")], photo) }),
            )
            .route("/garbage.jpg", get(|| async { "<html>not an image</html>" }))
            .route(
                "/hook",
                post(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        StatusCode::NO_CONTENT
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            webhook_hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn webhook_hits(&self) -> usize {
        self.webhook_hits.load(Ordering::SeqCst)
    }
}
