//! Vault audit log record parsing

use serde::Deserialize;

/// One parsed audit log line
///
/// Only the fields the classifier looks at are kept. Missing fields become empty
/// strings; an empty `error_text` means the request succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditRecord {
    pub request_path: String,
    pub auth_display_name: String,
    pub error_text: String,
}

/// Wire shape of an audit line. Every field is optional so that both a missing
/// key and an explicit `null` read as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAuditEntry {
    request: Option<RawRequest>,
    auth: Option<RawAuth>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRequest {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAuth {
    display_name: Option<String>,
}

impl AuditRecord {
    pub fn new(
        request_path: impl Into<String>,
        auth_display_name: impl Into<String>,
        error_text: impl Into<String>,
    ) -> Self {
        Self {
            request_path: request_path.into(),
            auth_display_name: auth_display_name.into(),
            error_text: error_text.into(),
        }
    }

    /// Parse one JSON audit line. Returns `None` for anything that is not a JSON object.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let raw: RawAuditEntry = serde_json::from_str(line).ok()?;

        Some(Self {
            request_path: raw.request.and_then(|r| r.path).unwrap_or_default(),
            auth_display_name: raw.auth.and_then(|a| a.display_name).unwrap_or_default(),
            error_text: raw.error.unwrap_or_default(),
        })
    }

    pub fn is_success(&self) -> bool {
        self.error_text.is_empty()
    }
}
