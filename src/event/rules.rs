//! Audit rules and the classifier
//!
//! Rules are plain data so extra privileged-path patterns are a config change.
//! Matching is case-sensitive substring matching on the raw request path.

use crate::event::{AuditRecord, NotificationIntent, Severity};
use chrono::{DateTime, Utc};
use tracing::debug;

pub const PRIVILEGED_ACCESS_TITLE: &str = "🚨 SECURITY ALERT: Privileged Access";
pub const UNSEAL_TITLE: &str = "🔓 Vault Unsealed";
pub const UNSEAL_DESCRIPTION: &str = "Vault has been successfully unsealed.";

const UNSEAL_PATH: &str = "sys/unseal";

/// Predicate half of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleMatcher {
    /// Path contains at least one of the patterns
    PathContainsAny(Vec<String>),
    /// Path contains the pattern and the request succeeded
    PathContainsWithoutError(String),
}

impl RuleMatcher {
    pub fn matches(&self, record: &AuditRecord) -> bool {
        match self {
            RuleMatcher::PathContainsAny(patterns) => patterns
                .iter()
                .any(|p| record.request_path.contains(p.as_str())),
            RuleMatcher::PathContainsWithoutError(pattern) => {
                record.request_path.contains(pattern.as_str()) && record.is_success()
            }
        }
    }
}

/// Intent half of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentTemplate {
    /// Names the acting identity and the exact path
    PrivilegedAccess,
    /// Fixed title and description
    Fixed {
        title: String,
        description: String,
        severity: Severity,
    },
}

impl IntentTemplate {
    fn render(&self, record: &AuditRecord, occurred_at: DateTime<Utc>) -> NotificationIntent {
        match self {
            IntentTemplate::PrivilegedAccess => NotificationIntent::at(
                PRIVILEGED_ACCESS_TITLE,
                format!(
                    "**User:** {}\n**Resource:** `{}`",
                    record.auth_display_name, record.request_path
                ),
                Severity::Critical,
                occurred_at,
            ),
            IntentTemplate::Fixed {
                title,
                description,
                severity,
            } => NotificationIntent::at(title.as_str(), description.as_str(), *severity, occurred_at),
        }
    }
}

/// A matcher paired with the intent it produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub matcher: RuleMatcher,
    pub template: IntentTemplate,
}

impl Rule {
    pub fn privileged_access(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: "privileged-access".to_string(),
            matcher: RuleMatcher::PathContainsAny(patterns.into_iter().map(Into::into).collect()),
            template: IntentTemplate::PrivilegedAccess,
        }
    }

    pub fn unseal_success() -> Self {
        Self {
            name: "unseal-success".to_string(),
            matcher: RuleMatcher::PathContainsWithoutError(UNSEAL_PATH.to_string()),
            template: IntentTemplate::Fixed {
                title: UNSEAL_TITLE.to_string(),
                description: UNSEAL_DESCRIPTION.to_string(),
                severity: Severity::Info,
            },
        }
    }
}

/// Ordered, immutable list of rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The two built-in rules with the default privileged paths
    pub fn builtin() -> Self {
        Self::with_privileged_paths(["sign/root", "database/creds/admin"])
    }

    /// Built-in rules with a custom list of privileged path patterns
    pub fn with_privileged_paths(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(vec![
            Rule::privileged_access(patterns),
            Rule::unseal_success(),
        ])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Evaluate every rule against the record, in order.
///
/// Not first-match: one record may produce several intents.
pub fn classify(
    record: &AuditRecord,
    rules: &RuleSet,
    occurred_at: DateTime<Utc>,
) -> Vec<NotificationIntent> {
    rules
        .rules()
        .iter()
        .filter(|rule| rule.matcher.matches(record))
        .map(|rule| {
            debug!(
                rule = %rule.name,
                path = %record.request_path,
                "Audit rule matched"
            );
            rule.template.render(record, occurred_at)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_now(record: &AuditRecord) -> Vec<NotificationIntent> {
        classify(record, &RuleSet::builtin(), Utc::now())
    }

    #[test]
    fn should_raise_critical_intent_for_sign_root() {
        // Arrange
        let record = AuditRecord::new("pki/sign/root", "token-alice", "");

        // Act
        let intents = classify_now(&record);

        // Assert
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].severity, Severity::Critical);
        assert_eq!(intents[0].title, PRIVILEGED_ACCESS_TITLE);
        assert!(intents[0].description.contains("token-alice"));
        assert!(intents[0].description.contains("`pki/sign/root`"));
    }

    #[test]
    fn should_raise_critical_intent_for_admin_db_creds_even_on_error() {
        // Arrange
        let record = AuditRecord::new("database/creds/admin-role", "", "permission denied");

        // Act
        let intents = classify_now(&record);

        // Assert
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].severity, Severity::Critical);
        assert!(intents[0]
            .description
            .contains("database/creds/admin-role"));
    }

    #[test]
    fn should_raise_info_intent_for_successful_unseal() {
        // Arrange
        let record = AuditRecord::new("sys/unseal", "", "");

        // Act
        let intents = classify_now(&record);

        // Assert
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].severity, Severity::Info);
        assert_eq!(intents[0].title, UNSEAL_TITLE);
        assert_eq!(intents[0].description, UNSEAL_DESCRIPTION);
    }

    #[test]
    fn should_not_raise_unseal_intent_when_error_present() {
        // Arrange
        let record = AuditRecord::new("sys/unseal", "", "invalid key");

        // Act
        let intents = classify_now(&record);

        // Assert
        assert!(intents.is_empty());
    }

    #[test]
    fn should_match_case_sensitively() {
        // Arrange
        let record = AuditRecord::new("PKI/SIGN/ROOT", "token-alice", "");

        // Act
        let intents = classify_now(&record);

        // Assert
        assert!(intents.is_empty());
    }

    #[test]
    fn should_not_normalize_paths() {
        // Arrange
        let record = AuditRecord::new("pki/sign//root", "token-alice", "");

        // Act
        let intents = classify_now(&record);

        // Assert
        assert!(intents.is_empty());
    }

    #[test]
    fn should_fire_every_matching_rule() {
        // Arrange
        let record = AuditRecord::new("sys/unseal/sign/root", "root", "");

        // Act
        let intents = classify_now(&record);

        // Assert
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].severity, Severity::Critical);
        assert_eq!(intents[1].severity, Severity::Info);
    }

    #[test]
    fn should_ignore_unrelated_paths() {
        // Arrange
        let record = AuditRecord::new("secret/data/app", "token-bob", "");

        // Act
        let intents = classify_now(&record);

        // Assert
        assert!(intents.is_empty());
    }

    #[test]
    fn should_use_configured_privileged_paths() {
        // Arrange
        let rules = RuleSet::with_privileged_paths(["sys/raw"]);
        let raw = AuditRecord::new("sys/raw/core", "token-carol", "");
        let sign = AuditRecord::new("pki/sign/root", "token-carol", "");

        // Act
        let raw_intents = classify(&raw, &rules, Utc::now());
        let sign_intents = classify(&sign, &rules, Utc::now());

        // Assert
        assert_eq!(raw_intents.len(), 1);
        assert!(sign_intents.is_empty());
    }

    #[test]
    fn should_stamp_intents_with_given_time() {
        // Arrange
        let at = DateTime::parse_from_rfc3339("2026-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = AuditRecord::new("sys/unseal", "", "");

        // Act
        let intents = classify(&record, &RuleSet::builtin(), at);

        // Assert
        assert_eq!(intents[0].occurred_at, at);
    }

    #[test]
    fn should_expose_builtin_rules_in_order() {
        let rules = RuleSet::builtin();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules()[0].name, "privileged-access");
        assert_eq!(rules.rules()[1].name, "unseal-success");
    }
}
