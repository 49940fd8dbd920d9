// src/ticket/jira.rs
use serde_json::Value;

use super::{string_at, PayloadExtractor, Platform, TicketEvent};
use crate::error::Result;

pub const DEFAULT_SOURCE_IP_FIELD: &str = "customfield_10060";
pub const DEFAULT_DESTINATION_IP_FIELD: &str = "customfield_10061";

/// Jira "issue created" webhook: requester at `user.displayName`, IPs in two
/// custom fields under `issue.fields`.
#[derive(Debug, Clone)]
pub struct JiraExtractor {
    source_ip_field: String,
    destination_ip_field: String,
}

impl Default for JiraExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_IP_FIELD, DEFAULT_DESTINATION_IP_FIELD)
    }
}

impl JiraExtractor {
    /// Custom field ids differ between Jira sites.
    pub fn new(source_ip_field: impl Into<String>, destination_ip_field: impl Into<String>) -> Self {
        Self {
            source_ip_field: source_ip_field.into(),
            destination_ip_field: destination_ip_field.into(),
        }
    }
}

impl PayloadExtractor for JiraExtractor {
    fn platform(&self) -> Platform {
        Platform::Jira
    }

    fn extract(&self, ticket_id: &str, body: &Value) -> Result<TicketEvent> {
        let requester = string_at(body, &["user", "displayName"])?;
        let source_ip = string_at(body, &["issue", "fields", self.source_ip_field.as_str()])?;
        let destination_ip = string_at(body, &["issue", "fields", self.destination_ip_field.as_str()])?;
        Ok(TicketEvent {
            platform: Platform::Jira,
            ticket_id: ticket_id.to_string(),
            requester,
            source_ip,
            destination_ip,
        })
    }
}
