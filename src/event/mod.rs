//! Audit events and notification intents
//!
//! - Parsing of individual audit log lines
//! - Notification intents and their severity
//! - Rule set and classifier mapping records to intents

pub mod audit_record;
pub mod rules;

#[allow(clippy::module_inception)]
mod event_types;

pub use audit_record::AuditRecord;
pub use event_types::{NotificationIntent, Severity};
pub use rules::{classify, IntentTemplate, Rule, RuleMatcher, RuleSet};
