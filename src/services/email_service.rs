// services/email_service.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::errors::{AppError, Result};
use crate::models::transaction::{ConfirmedTransaction, NO_EMAIL};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Transactional email, abstracted so the webhook dispatcher can be tested
/// with a counting stub. Implementations report failures to their direct
/// caller; the dispatcher swallows them.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_confirmation(&self, email: &str, tx: &ConfirmedTransaction) -> Result<()>;
    async fn send_failure_notice(&self, email: &str, tx: &ConfirmedTransaction) -> Result<()>;
}

/// SendGrid-backed sender. Email is a soft dependency: when the API key or
/// from-address is unconfigured, or the recipient is the no-email
/// sentinel, sends are silent no-ops rather than errors.
pub struct SendGridSender {
    api_key: Option<String>,
    from_email: Option<String>,
    client: Client,
}

impl SendGridSender {
    pub fn new(api_key: Option<String>, from_email: Option<String>) -> Self {
        Self {
            api_key,
            from_email,
            client: Client::new(),
        }
    }

    fn credentials(&self, email: &str) -> Option<(&str, &str)> {
        if email.is_empty() || email == NO_EMAIL {
            info!("no customer email on record, skipping notification");
            return None;
        }
        match (self.api_key.as_deref(), self.from_email.as_deref()) {
            (Some(key), Some(from)) => Some((key, from)),
            _ => {
                info!("SendGrid not configured, skipping notification");
                None
            }
        }
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<()> {
        let (api_key, from) = match self.credentials(to) {
            Some(creds) => creds,
            None => return Ok(()),
        };

        let payload = json!({
            "personalizations": [{"to": [{"email": to}]}],
            "from": {"email": from},
            "subject": subject,
            "content": [{"type": "text/plain", "value": body}],
        });

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::email(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to, subject, "notification email sent");
            Ok(())
        } else {
            let status = response.status();
            warn!(to, %status, "SendGrid rejected the send");
            Err(AppError::email(format!(
                "SendGrid returned {}",
                status
            )))
        }
    }
}

fn format_amount(tx: &ConfirmedTransaction) -> String {
    format!(
        "${:.2} {}",
        tx.amount as f64 / 100.0,
        tx.currency.to_uppercase()
    )
}

#[async_trait]
impl NotificationSender for SendGridSender {
    async fn send_confirmation(&self, email: &str, tx: &ConfirmedTransaction) -> Result<()> {
        let body = format!(
            "Thank you for your payment of {}.\n\nReference: {}\n",
            format_amount(tx),
            tx.id
        );
        self.send(email, "Payment confirmation", body).await
    }

    async fn send_failure_notice(&self, email: &str, tx: &ConfirmedTransaction) -> Result<()> {
        let body = format!(
            "Your payment of {} could not be completed. No charge was made.\n\nReference: {}\n",
            format_amount(tx),
            tx.id
        );
        self.send(email, "Payment failed", body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn sample_tx() -> ConfirmedTransaction {
        ConfirmedTransaction {
            id: "pi_1".into(),
            amount: 1234,
            currency: "usd".into(),
            customer_email: NO_EMAIL.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn unconfigured_sender_is_a_noop() {
        let sender = SendGridSender::new(None, None);
        let tx = sample_tx();
        assert!(sender.send_confirmation("user@example.com", &tx).await.is_ok());
        assert!(sender.send_failure_notice("user@example.com", &tx).await.is_ok());
    }

    #[tokio::test]
    async fn sentinel_email_is_a_noop_even_when_configured() {
        let sender =
            SendGridSender::new(Some("sg_key".into()), Some("from@example.com".into()));
        let tx = sample_tx();
        assert!(sender.send_confirmation(NO_EMAIL, &tx).await.is_ok());
        assert!(sender.send_confirmation("", &tx).await.is_ok());
    }

    #[test]
    fn amounts_render_in_major_units() {
        assert_eq!(format_amount(&sample_tx()), "$12.34 USD");
    }
}
