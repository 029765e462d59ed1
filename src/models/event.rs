// models/event.rs
use serde::Deserialize;
use std::collections::HashMap;

/// A Stripe webhook event. Transient: verified, dispatched, then dropped —
/// only its side effects are persisted.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: IntentObject,
}

/// The payment-intent object embedded in an event (or returned by the
/// intents API). Only the fields this service acts on.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentObject {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub receipt_email: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Succeeded,
    Failed,
    Other,
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            "payment_intent.succeeded" => EventKind::Succeeded,
            "payment_intent.payment_failed" => EventKind::Failed,
            _ => EventKind::Other,
        }
    }
}

impl IntentObject {
    /// Customer email for notifications. The metadata value is preferred
    /// because this service set it at intent creation; `receipt_email` is
    /// client-supplied and only a fallback.
    pub fn customer_email(&self) -> String {
        self.metadata
            .get("email")
            .filter(|e| !e.is_empty())
            .cloned()
            .or_else(|| self.receipt_email.clone().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| crate::models::transaction::NO_EMAIL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_json(event_type: &str) -> String {
        format!(
            r#"{{
                "id": "evt_1",
                "type": "{}",
                "created": 1700000000,
                "data": {{
                    "object": {{
                        "id": "pi_123",
                        "amount": 1234,
                        "currency": "usd",
                        "status": "succeeded",
                        "receipt_email": "top@example.com",
                        "metadata": {{"email": "meta@example.com", "code": "basic"}}
                    }}
                }}
            }}"#,
            event_type
        )
    }

    #[test]
    fn maps_event_types_to_kinds() {
        let succeeded: WebhookEvent =
            serde_json::from_str(&event_json("payment_intent.succeeded")).unwrap();
        assert_eq!(succeeded.kind(), EventKind::Succeeded);

        let failed: WebhookEvent =
            serde_json::from_str(&event_json("payment_intent.payment_failed")).unwrap();
        assert_eq!(failed.kind(), EventKind::Failed);

        let other: WebhookEvent =
            serde_json::from_str(&event_json("charge.refunded")).unwrap();
        assert_eq!(other.kind(), EventKind::Other);
    }

    #[test]
    fn metadata_email_wins_over_receipt_email() {
        let event: WebhookEvent =
            serde_json::from_str(&event_json("payment_intent.succeeded")).unwrap();
        assert_eq!(event.data.object.customer_email(), "meta@example.com");
    }

    #[test]
    fn falls_back_to_receipt_email_then_sentinel() {
        let mut intent = IntentObject {
            id: "pi_1".into(),
            amount: 500,
            currency: "usd".into(),
            status: None,
            receipt_email: Some("top@example.com".into()),
            metadata: HashMap::new(),
        };
        assert_eq!(intent.customer_email(), "top@example.com");

        intent.receipt_email = None;
        assert_eq!(intent.customer_email(), "no-email");
    }

    #[test]
    fn parses_event_with_missing_optional_fields() {
        let raw = r#"{
            "id": "evt_2",
            "type": "payment_intent.succeeded",
            "created": 1700000001,
            "data": {"object": {"id": "pi_9", "amount": 50, "currency": "usd"}}
        }"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.data.object.customer_email(), "no-email");
        assert!(event.data.object.metadata.is_empty());
    }
}
