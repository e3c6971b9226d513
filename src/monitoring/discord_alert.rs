//! Discord-style webhook notifier
//!
//! Sends one embed per notification. Delivery is best-effort: failures are logged
//! and reported back as a `NotifyOutcome`, never as an error.

use crate::event::{NotificationIntent, Severity};
use crate::utils::AppError;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default webhook request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook message payload
#[derive(Debug, Serialize)]
pub struct DiscordMessage {
    pub embeds: Vec<DiscordEmbed>,
}

/// Embed for rich messages
#[derive(Debug, Clone, Serialize)]
pub struct DiscordEmbed {
    pub title: String,
    pub description: String,
    /// RGB color as a decimal integer
    pub color: u32,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Embed color constants
pub mod colors {
    /// Critical - red
    pub const CRITICAL: u32 = 0xE74C3C;
    /// Warning - yellow
    pub const WARNING: u32 = 0xF1C40F;
    /// Info - green
    pub const INFO: u32 = 0x2ECC71;
    /// Monitor lifecycle - blue
    pub const STATUS: u32 = 0x3498DB;
}

/// Result of a delivery attempt. Only for logging and counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    Failed(String),
    Disabled,
}

/// Webhook notifier
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    webhook_url: String,
    client: Client,
    enabled: bool,
}

impl DiscordNotifier {
    /// Create a notifier with the default 10s timeout
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, AppError> {
        Self::with_timeout(webhook_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpClient(e.to_string()))?;

        Ok(Self {
            webhook_url: webhook_url.into(),
            client,
            enabled: true,
        })
    }

    /// Create a notifier that drops everything (for testing)
    pub fn disabled() -> Self {
        Self {
            webhook_url: String::new(),
            client: Client::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.webhook_url.is_empty()
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    pub fn severity_to_color(severity: Severity) -> u32 {
        match severity {
            Severity::Critical => colors::CRITICAL,
            Severity::Warning => colors::WARNING,
            Severity::Info => colors::INFO,
        }
    }

    /// Build the webhook payload for an intent
    pub fn build_message(intent: &NotificationIntent, color: u32) -> DiscordMessage {
        DiscordMessage {
            embeds: vec![DiscordEmbed {
                title: intent.title.clone(),
                description: intent.description.clone(),
                color,
                timestamp: intent.occurred_at.to_rfc3339(),
            }],
        }
    }

    /// Deliver an intent, colored by its severity
    pub async fn notify(&self, intent: &NotificationIntent) -> NotifyOutcome {
        self.notify_with_color(intent, Self::severity_to_color(intent.severity))
            .await
    }

    /// Deliver an intent with an explicit embed color
    #[instrument(skip(self, intent), fields(title = %intent.title, severity = %intent.severity))]
    pub async fn notify_with_color(&self, intent: &NotificationIntent, color: u32) -> NotifyOutcome {
        if !self.is_enabled() {
            debug!("Webhook notifications disabled, skipping");
            return NotifyOutcome::Disabled;
        }

        let payload = Self::build_message(intent, color);

        let response = match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Failed to send webhook notification");
                return NotifyOutcome::Failed(e.to_string());
            }
        };

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Webhook returned error");
            return NotifyOutcome::Failed(format!("webhook returned {}", status));
        }

        info!("Webhook notification sent");
        NotifyOutcome::Delivered
    }
}
