//! Completion webhook.

use std::time::Duration;

use crate::error::WebhookError;
use crate::sanitize;

#[derive(Debug, Clone)]
pub struct Webhook {
    client: reqwest::Client,
}

impl Webhook {
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// POSTs an empty body to `url`. Any non-2xx answer is an error.
    pub async fn notify(&self, url: &str, job_id: &str) -> Result<(), WebhookError> {
        let response = self.client.post(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status(status));
        }
        tracing::info!(job_id, url = %sanitize::redact_url(url), "Webhook delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_notify_posts_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let base = serve(Router::new().route(
            "/hook",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }
            }),
        ))
        .await;

        let webhook = Webhook::new(Duration::from_secs(5)).unwrap();
        webhook.notify(&format!("{}/hook", base), "abc1234").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let base = serve(Router::new().route(
            "/hook",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;

        let webhook = Webhook::new(Duration::from_secs(5)).unwrap();
        let result = webhook.notify(&format!("{}/hook", base), "abc1234").await;
        assert!(matches!(result, Err(WebhookError::Status(s)) if s.as_u16() == 500));
    }
}
