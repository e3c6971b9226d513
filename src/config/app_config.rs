use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file location used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vault-warden.yaml";

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PRIVILEGED_PATHS: [&str; 2] = ["sign/root", "database/creds/admin"];

/// Raw YAML document, before validation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    address: Option<String>,
    unseal_keys: Option<Vec<String>>,
    webhook_url: Option<String>,
    audit_log: Option<PathBuf>,
    poll_interval_ms: Option<u64>,
    http_timeout_secs: Option<u64>,
    privileged_paths: Option<Vec<String>>,
}

/// Validated warden configuration
///
/// Built once at startup and passed explicitly to every component.
#[derive(Debug, Clone)]
pub struct WardenConfig {
    /// Base URL of the Vault server
    pub address: String,
    /// Unseal key shares, submitted in this order
    pub unseal_keys: Vec<String>,
    /// Notification webhook endpoint
    pub webhook_url: String,
    /// Vault audit log file
    pub audit_log: PathBuf,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    /// Substrings of request paths that count as privileged access
    pub privileged_paths: Vec<String>,
}

impl WardenConfig {
    /// Load and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_yaml(&content)?;

        tracing::debug!(
            path = %path.display(),
            address = %config.address,
            audit_log = %config.audit_log.display(),
            unseal_keys = config.unseal_keys.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(content)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let address = required_string(raw.address, "address")?;
        let webhook_url = required_string(raw.webhook_url, "webhook_url")?;

        let audit_log = raw
            .audit_log
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::MissingField("audit_log"))?;

        let unseal_keys = raw
            .unseal_keys
            .filter(|keys| !keys.is_empty())
            .ok_or(ConfigError::MissingField("unseal_keys"))?;

        let poll_interval_ms = raw.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        let http_timeout_secs = raw.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if http_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "http_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let privileged_paths = match raw.privileged_paths {
            Some(paths) if paths.iter().any(|p| p.is_empty()) => {
                return Err(ConfigError::Invalid(
                    "privileged_paths must not contain empty patterns".to_string(),
                ));
            }
            Some(paths) if !paths.is_empty() => paths,
            _ => DEFAULT_PRIVILEGED_PATHS.iter().map(|p| p.to_string()).collect(),
        };

        Ok(Self {
            address,
            unseal_keys,
            webhook_url,
            audit_log,
            poll_interval: Duration::from_millis(poll_interval_ms),
            http_timeout: Duration::from_secs(http_timeout_secs),
            privileged_paths,
        })
    }
}

fn required_string(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField(field))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("missing required config field `{0}`")]
    MissingField(&'static str),
    #[error("invalid config: {0}")]
    Invalid(String),
}
