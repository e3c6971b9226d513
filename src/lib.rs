//! Vault warden: keeps a Vault server unsealed and reports privileged
//! audit-log activity to a webhook.

pub mod config;
pub mod event;
pub mod monitoring;
pub mod shutdown;
pub mod utils;
pub mod vault;

use std::future::Future;
use std::sync::Arc;

use config::WardenConfig;
use event::RuleSet;
use monitoring::{AuditMonitor, DiscordNotifier, MonitorReport};
use utils::AppError;
use vault::{UnsealOutcome, UnsealReconciler, VaultClient};

/// `unlock` mode: one reconciliation pass against the configured server
pub async fn run_unlock(config: &WardenConfig) -> Result<UnsealOutcome, AppError> {
    let notifier = DiscordNotifier::with_timeout(&config.webhook_url, config.http_timeout)?;
    let client = VaultClient::with_timeout(&config.address, config.http_timeout)?;

    UnsealReconciler::new(Arc::new(client), notifier, config.unseal_keys.clone())
        .reconcile()
        .await
}

/// `audit` mode: follow the audit log until `shutdown` completes
pub async fn run_audit<F>(config: &WardenConfig, shutdown: F) -> Result<MonitorReport, AppError>
where
    F: Future<Output = ()>,
{
    let notifier = DiscordNotifier::with_timeout(&config.webhook_url, config.http_timeout)?;
    let rules = RuleSet::with_privileged_paths(config.privileged_paths.iter().cloned());

    AuditMonitor::new(&config.audit_log, rules, notifier)
        .with_poll_interval(config.poll_interval)
        .run(shutdown)
        .await
}
