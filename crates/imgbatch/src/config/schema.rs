use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Holds `downloads/`, `uploads/` and the published `public/` tree.
    #[serde(default = "default_storage_root")]
    pub storage_root: String,
    /// Externally served address of the `public/` directory.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Defaults to `{storage_root}/imgbatch.db`.
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

fn default_storage_root() -> String {
    ".".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            storage_root: default_storage_root(),
            public_base_url: default_public_base_url(),
            database_path: None,
            scheduler: SchedulerConfig::default(),
            compression: CompressionConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            http: HttpConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl Config {
    pub fn storage_root(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => self.storage_root().join("imgbatch.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// JPEG quality, 0-100.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_quality() -> u8 {
    50
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Process-wide cap on in-flight downloads.
    #[serde(default = "default_downloads")]
    pub downloads: usize,
    /// Process-wide cap on concurrent re-encodes.
    #[serde(default = "default_compressions")]
    pub compressions: usize,
}

fn default_downloads() -> usize {
    8
}

fn default_compressions() -> usize {
    num_cpus::get()
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            downloads: default_downloads(),
            compressions: default_compressions(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connect timeout for image downloads. Unset keeps the client default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_webhook_timeout_secs(),
        }
    }
}
