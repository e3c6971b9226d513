//! Audit log monitoring
//!
//! - Rotation-aware log following
//! - Webhook notifications
//! - The monitor loop tying them together

pub mod discord_alert;
pub mod log_watcher;
pub mod processor;

pub use discord_alert::{DiscordNotifier, NotifyOutcome};
pub use log_watcher::LogFollower;
pub use processor::{AuditMonitor, MonitorReport, MonitorState};
