use crate::config::ConfigError;
use std::path::PathBuf;

/// Application-wide error type
///
/// Components return these to their direct caller. Only the `unlock` and `audit`
/// entry points decide whether an error ends the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("audit log {} is not accessible: {source}", path.display())]
    AuditLogUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Vault request failed: {0}")]
    VaultRequest(String),

    #[error("unexpected Vault response: {0}")]
    VaultResponse(String),

    #[error(
        "Vault is still sealed after {keys_submitted} keys (progress {progress}/{threshold})"
    )]
    StillSealed {
        keys_submitted: usize,
        progress: u32,
        threshold: u32,
    },
}

impl AppError {
    /// Short machine-readable code, used as a structured log field
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG",
            AppError::AuditLogUnavailable { .. } => "AUDIT_LOG",
            AppError::HttpClient(_) => "HTTP_CLIENT",
            AppError::VaultRequest(_) => "VAULT_REQUEST",
            AppError::VaultResponse(_) => "VAULT_RESPONSE",
            AppError::StillSealed { .. } => "STILL_SEALED",
        }
    }

    pub fn vault_request(msg: impl Into<String>) -> Self {
        AppError::VaultRequest(msg.into())
    }

    pub fn vault_response(msg: impl Into<String>) -> Self {
        AppError::VaultResponse(msg.into())
    }
}
