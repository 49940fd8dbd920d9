// src/ticket/mod.rs
pub mod jira;
pub mod servicenow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AutomationError, Result};

pub use jira::JiraExtractor;
pub use servicenow::ServiceNowExtractor;

/// Which ticketing system a webhook came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Change/incident ticketing platform.
    ServiceNow,
    /// Issue tracker.
    Jira,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::ServiceNow => "servicenow",
            Platform::Jira => "jira",
        }
    }

    /// Extra-variable name carrying the ticket reference into the job.
    pub fn reference_key(self) -> &'static str {
        match self {
            Platform::ServiceNow => "servicenow_record",
            Platform::Jira => "jira_issue_key",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical record of one inbound notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketEvent {
    pub platform: Platform,
    pub ticket_id: String,
    pub requester: String,
    pub source_ip: String,
    pub destination_ip: String,
}

/// Turns a platform-specific webhook body into a [`TicketEvent`].
///
/// `ticket_id` always comes from the route; bodies are only read for the
/// requester and the two IP addresses. Implementations never return a
/// partially filled event.
pub trait PayloadExtractor: Send + Sync {
    fn platform(&self) -> Platform;
    fn extract(&self, ticket_id: &str, body: &Value) -> Result<TicketEvent>;
}

/// Walk `path` through nested objects and return the string found there.
/// Absent keys, nulls and non-string leaves all count as missing; the error
/// names the full dotted path.
pub(crate) fn string_at(body: &Value, path: &[&str]) -> Result<String> {
    let mut cur = body;
    for key in path {
        cur = cur
            .get(key)
            .ok_or_else(|| AutomationError::MissingField(path.join(".")))?;
    }
    cur.as_str()
        .map(str::to_string)
        .ok_or_else(|| AutomationError::MissingField(path.join(".")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_at_walks_nested_objects() {
        let body = json!({"a": {"b": {"c": "x"}}});
        assert_eq!(string_at(&body, &["a", "b", "c"]).unwrap(), "x");
    }

    #[test]
    fn string_at_reports_full_path() {
        let body = json!({"a": {"b": null}});
        assert_eq!(
            string_at(&body, &["a", "b"]).unwrap_err(),
            AutomationError::MissingField("a.b".into())
        );
        assert_eq!(
            string_at(&body, &["a", "z", "c"]).unwrap_err(),
            AutomationError::MissingField("a.z.c".into())
        );
    }

    #[test]
    fn platform_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Platform::Jira).unwrap(), "\"jira\"");
        assert_eq!(Platform::ServiceNow.reference_key(), "servicenow_record");
    }
}
