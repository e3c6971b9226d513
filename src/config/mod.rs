pub mod app_config;

pub use app_config::{ConfigError, WardenConfig, DEFAULT_CONFIG_PATH};
