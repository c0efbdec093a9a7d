//! Tracing subscriber setup.
//!
//! `RUST_LOG` controls the filter (default `info`). Records emitted through
//! the `log` macros are forwarded into tracing.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Plain text by default, one JSON object
/// per line with `json`. Calling it again is a no-op.
pub fn init_logging(json: bool) {
    LOGGER_INITIALIZED.get_or_init(|| {
        if let Err(e) = tracing_log::LogTracer::init() {
            eprintln!("log bridge already installed: {}", e);
        }

        let layer = if json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_filter(env_filter())
                .boxed()
        } else {
            fmt::layer()
                .with_target(false)
                .with_filter(env_filter())
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("Global tracing subscriber already set");
        }
    });
}
