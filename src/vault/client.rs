use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::utils::AppError;

/// Default timeout for each Vault request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const HEALTH_PATH: &str = "/v1/sys/health";
const UNSEAL_PATH: &str = "/v1/sys/unseal";

/// Seal state as reported by `sys/health` and `sys/unseal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SealStatus {
    pub sealed: bool,
    #[serde(default)]
    pub initialized: bool,
    /// Key shares accepted so far in the current unseal attempt
    #[serde(default)]
    pub progress: u32,
    /// Shares required to unseal
    #[serde(rename = "t", default)]
    pub threshold: u32,
}

#[derive(Debug, Serialize)]
struct UnsealRequest<'a> {
    key: &'a str,
}

/// Seal-state API of the Vault server
///
/// Abstracted so the reconciler can be tested against a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SealApi: Send + Sync {
    /// Read the current seal state
    async fn check_health(&self) -> Result<SealStatus, AppError>;

    /// Submit one unseal key share and return the resulting state
    async fn submit_key(&self, key: &str) -> Result<SealStatus, AppError>;
}

/// Shared handle to a seal-state client
pub type SealClient = Arc<dyn SealApi>;

/// HTTP implementation of [`SealApi`]
#[derive(Debug, Clone)]
pub struct VaultClient {
    address: String,
    client: Client,
}

impl VaultClient {
    pub fn new(address: impl Into<String>) -> Result<Self, AppError> {
        Self::with_timeout(address, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(address: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpClient(e.to_string()))?;

        Ok(Self {
            address: address.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Decode a status body regardless of HTTP status.
    ///
    /// Vault answers `sys/health` with 200 when unsealed and 503 when sealed (plus
    /// other codes for standby nodes); all of them carry the same body.
    async fn read_status(response: reqwest::Response) -> Result<SealStatus, AppError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::vault_request(format!("failed to read response body: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            AppError::vault_response(format!("HTTP {} with unparseable body ({}): {}", status, e, body))
        })
    }
}

#[async_trait::async_trait]
impl SealApi for VaultClient {
    #[instrument(skip(self), fields(address = %self.address))]
    async fn check_health(&self) -> Result<SealStatus, AppError> {
        let response = self
            .client
            .get(self.url(HEALTH_PATH))
            .send()
            .await
            .map_err(|e| AppError::vault_request(format!("health check failed: {}", e)))?;

        let status = Self::read_status(response).await?;
        debug!(
            sealed = status.sealed,
            progress = status.progress,
            threshold = status.threshold,
            "Vault health read"
        );
        Ok(status)
    }

    #[instrument(skip(self, key), fields(address = %self.address))]
    async fn submit_key(&self, key: &str) -> Result<SealStatus, AppError> {
        let response = self
            .client
            .put(self.url(UNSEAL_PATH))
            .json(&UnsealRequest { key })
            .send()
            .await
            .map_err(|e| AppError::vault_request(format!("unseal request failed: {}", e)))?;

        let status = Self::read_status(response).await?;
        debug!(
            sealed = status.sealed,
            progress = status.progress,
            threshold = status.threshold,
            "Unseal key accepted"
        );
        Ok(status)
    }
}
