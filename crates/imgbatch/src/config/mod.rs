pub mod loader;
pub mod schema;

pub use loader::{apply_env_overrides, load_config, load_config_from_str, load_with_env};
pub use schema::{
    CompressionConfig, ConcurrencyConfig, Config, HttpConfig, SchedulerConfig, WebhookConfig,
};
