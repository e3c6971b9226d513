//! One-shot unseal reconciliation
//!
//! Check health; if sealed, submit the configured keys in order until Vault
//! reports unsealed or the keys run out. Retrying is the scheduler's job.

use crate::event::{NotificationIntent, Severity};
use crate::monitoring::DiscordNotifier;
use crate::utils::AppError;
use crate::vault::{SealClient, SealStatus};
use tracing::{info, warn};

pub const UNSEALED_TITLE: &str = "🔓 Vault Unsealed";
pub const UNSEAL_INCOMPLETE_TITLE: &str = "⚠️ Unseal Incomplete";

/// Successful reconciliation results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsealOutcome {
    /// Vault was not sealed; nothing submitted
    AlreadyUnsealed,
    /// Vault became unsealed after this many submissions
    Unsealed { keys_submitted: usize },
}

pub struct UnsealReconciler {
    client: SealClient,
    notifier: DiscordNotifier,
    keys: Vec<String>,
}

impl UnsealReconciler {
    pub fn new(client: SealClient, notifier: DiscordNotifier, keys: Vec<String>) -> Self {
        Self {
            client,
            notifier,
            keys,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// Keys already submitted in a failed pass stay submitted; Vault keeps the
    /// partial progress until it is reset or completed.
    pub async fn reconcile(&self) -> Result<UnsealOutcome, AppError> {
        let health = self.client.check_health().await?;

        if !health.sealed {
            info!("Vault is already unsealed, skipping");
            return Ok(UnsealOutcome::AlreadyUnsealed);
        }

        info!(
            keys = self.keys.len(),
            progress = health.progress,
            threshold = health.threshold,
            "Vault is sealed, sending keys"
        );

        let mut last = health;
        let mut keys_submitted = 0;

        for (index, key) in self.keys.iter().enumerate() {
            keys_submitted += 1;
            match self.client.submit_key(key).await {
                Ok(status) if !status.sealed => {
                    info!(keys_submitted, "Vault unsealed");
                    self.notify_unsealed(keys_submitted).await;
                    return Ok(UnsealOutcome::Unsealed { keys_submitted });
                }
                Ok(status) => {
                    info!(
                        key_index = index + 1,
                        progress = status.progress,
                        threshold = status.threshold,
                        "Key accepted, still sealed"
                    );
                    last = status;
                }
                Err(e) => {
                    warn!(key_index = index + 1, error = %e, "Key submission failed, continuing");
                }
            }
        }

        let error = AppError::StillSealed {
            keys_submitted,
            progress: last.progress,
            threshold: last.threshold,
        };
        warn!(error = %error, "Unseal pass exhausted all keys");
        self.notify_incomplete(&error, last).await;
        Err(error)
    }

    async fn notify_unsealed(&self, keys_submitted: usize) {
        let intent = NotificationIntent::new(
            UNSEALED_TITLE,
            format!(
                "Vault was sealed and has been unsealed after submitting {} key(s).",
                keys_submitted
            ),
            Severity::Critical,
        );
        self.notifier.notify(&intent).await;
    }

    async fn notify_incomplete(&self, error: &AppError, last: SealStatus) {
        let intent = NotificationIntent::new(
            UNSEAL_INCOMPLETE_TITLE,
            format!(
                "{}. Unseal progress is {}/{}; the next scheduled run will retry.",
                error, last.progress, last.threshold
            ),
            Severity::Warning,
        );
        self.notifier.notify(&intent).await;
    }
}
