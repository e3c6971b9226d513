//! Notification intent and severity types

use chrono::{DateTime, Utc};

/// Notification severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Severity {
    /// Info: lifecycle and successful operations
    #[default]
    Info = 0,
    /// Warning: something needs attention but nothing is compromised
    Warning = 1,
    /// Critical: privileged access or a state change operators must see
    Critical = 2,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification ready to be delivered
///
/// Produced by the classifier or by the monitor/reconciler themselves and handed
/// straight to the notifier. Never queued or persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub occurred_at: DateTime<Utc>,
}

impl NotificationIntent {
    /// Create an intent stamped with the current time
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self::at(title, description, severity, Utc::now())
    }

    /// Create an intent with an explicit timestamp
    pub fn at(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            occurred_at,
        }
    }
}
