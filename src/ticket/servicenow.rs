// src/ticket/servicenow.rs
use serde_json::Value;

use super::{string_at, PayloadExtractor, Platform, TicketEvent};
use crate::error::Result;

/// Flat body posted by the ServiceNow business rule:
/// `{"reported_by_email": .., "source_ip": .., "destination_ip": .., ...}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceNowExtractor;

impl PayloadExtractor for ServiceNowExtractor {
    fn platform(&self) -> Platform {
        Platform::ServiceNow
    }

    fn extract(&self, ticket_id: &str, body: &Value) -> Result<TicketEvent> {
        let requester = string_at(body, &["reported_by_email"])?;
        let source_ip = string_at(body, &["source_ip"])?;
        let destination_ip = string_at(body, &["destination_ip"])?;
        Ok(TicketEvent {
            platform: Platform::ServiceNow,
            ticket_id: ticket_id.to_string(),
            requester,
            source_ip,
            destination_ip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutomationError;
    use serde_json::json;

    #[test]
    fn extracts_top_level_fields_and_ignores_extras() {
        let body = json!({
            "number": "INC0010001",
            "reported_by_email": "abel.tuter@example.com",
            "short_description": "cannot reach db",
            "source_ip": "192.0.2.10",
            "destination_ip": "198.51.100.7"
        });
        let ev = ServiceNowExtractor.extract("INC0010001", &body).unwrap();
        assert_eq!(ev.platform, Platform::ServiceNow);
        assert_eq!(ev.ticket_id, "INC0010001");
        assert_eq!(ev.requester, "abel.tuter@example.com");
        assert_eq!(ev.source_ip, "192.0.2.10");
        assert_eq!(ev.destination_ip, "198.51.100.7");
    }

    #[test]
    fn missing_destination_is_named() {
        let body = json!({"reported_by_email": "a@b.c", "source_ip": "192.0.2.10"});
        assert_eq!(
            ServiceNowExtractor.extract("INC1", &body).unwrap_err(),
            AutomationError::MissingField("destination_ip".into())
        );
    }
}
