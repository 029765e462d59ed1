// services/stripe_service.rs
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::{AppError, Result};
use crate::models::event::IntentObject;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe documents a 5 minute default tolerance for webhook timestamps.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Intent as returned by the intents API: the embedded-object shape plus
/// the client secret and the (optionally expanded) payment method.
#[derive(Debug, Deserialize)]
pub struct PaymentIntentResponse {
    #[serde(flatten)]
    pub intent: IntentObject,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethodField>,
}

/// `payment_method` is a bare id unless the request asked for expansion.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PaymentMethodField {
    Expanded(PaymentMethodObject),
    Id(String),
}

#[derive(Debug, Deserialize)]
pub struct PaymentMethodObject {
    #[serde(default)]
    pub card: Option<CardDetails>,
}

#[derive(Debug, Deserialize)]
pub struct CardDetails {
    pub brand: String,
    pub last4: String,
}

/// Provider-agnostic view of an intent for display; no Stripe-specific
/// fields leak to the client.
#[derive(Debug, Serialize)]
pub struct SimplifiedIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
}

/// Stateless facade over the Stripe REST API. Owns its HTTP client for the
/// process lifetime; constructed once at startup, only when the secret key
/// is configured.
#[derive(Debug, Clone)]
pub struct StripeService {
    secret_key: String,
    client: Client,
}

impl StripeService {
    pub fn new(secret_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::configuration(format!("HTTP client: {}", e)))?;

        Ok(StripeService { secret_key, client })
    }

    /// Creates a payment intent and returns its client secret. `amount` is
    /// in minor units. The email and original request values are attached
    /// as metadata so the webhook handler can trust them later — the
    /// webhook cannot trust anything client-supplied, only what this call
    /// round-trips through Stripe.
    pub async fn create_intent(
        &self,
        amount: i64,
        email: Option<&str>,
        code: Option<&str>,
    ) -> Result<String> {
        let amount_str = amount.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("amount", amount_str.as_str()),
            ("currency", "usd"),
            ("automatic_payment_methods[enabled]", "true"),
        ];
        if let Some(email) = email {
            params.push(("receipt_email", email));
            params.push(("metadata[email]", email));
        }
        if let Some(code) = code {
            params.push(("metadata[code]", code));
        }
        params.push(("metadata[original_amount]", amount_str.as_str()));

        let response = self
            .client
            .post(format!("{}/payment_intents", STRIPE_API_BASE))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.api_error(status, response.text().await.ok()));
        }

        let intent: PaymentIntentResponse = response.json().await?;
        info!(intent_id = %intent.intent.id, amount, "payment intent created");

        intent
            .client_secret
            .ok_or_else(|| AppError::stripe("Stripe returned no client secret"))
    }

    /// Fetches an intent with its payment method expanded and reduces it
    /// for display.
    pub async fn retrieve_intent(&self, id: &str) -> Result<SimplifiedIntent> {
        let response = self
            .client
            .get(format!("{}/payment_intents/{}", STRIPE_API_BASE, id))
            .query(&[("expand[]", "payment_method")])
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::IntentNotFound(id.to_string()));
        }
        if !status.is_success() {
            return Err(self.api_error(status, response.text().await.ok()));
        }

        let intent: PaymentIntentResponse = response.json().await?;
        let card = match intent.payment_method {
            Some(PaymentMethodField::Expanded(pm)) => pm.card,
            _ => None,
        };

        Ok(SimplifiedIntent {
            id: intent.intent.id,
            amount: intent.intent.amount,
            currency: intent.intent.currency,
            status: intent.intent.status,
            card_brand: card.as_ref().map(|c| c.brand.clone()),
            card_last4: card.map(|c| c.last4),
        })
    }

    // Surfaces the provider's own message verbatim when the body parses as
    // a Stripe error envelope; retries are the caller's concern.
    fn api_error(&self, status: reqwest::StatusCode, body: Option<String>) -> AppError {
        if let Some(body) = body {
            if let Ok(parsed) = serde_json::from_str::<StripeErrorBody>(&body) {
                warn!(
                    status = %status,
                    code = ?parsed.error.code,
                    "stripe API error: {}", parsed.error.message
                );
                return AppError::stripe(parsed.error.message);
            }
        }
        AppError::stripe(format!("Stripe API returned {}", status))
    }
}

/// Verifies a Stripe webhook signature over the exact raw body.
///
/// Header format: `t=<unix>,v1=<hex>[,v1=<hex>...]`. The signed payload is
/// `"{t}.{body}"` and the scheme is HMAC-SHA256 with the endpoint's
/// signing secret. Timestamps outside the tolerance window are rejected to
/// limit replay.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str) -> Result<()> {
    verify_signature_at(payload, header, secret, Utc::now().timestamp())
}

fn verify_signature_at(payload: &[u8], header: &str, secret: &str, now: i64) -> Result<()> {
    let mut timestamp = "";
    let mut signatures = Vec::new();

    for element in header.split(',') {
        if let Some(t) = element.trim().strip_prefix("t=") {
            timestamp = t;
        } else if let Some(s) = element.trim().strip_prefix("v1=") {
            signatures.push(s);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err(AppError::SignatureVerification(
            "invalid signature header format".to_string(),
        ));
    }

    let ts: i64 = timestamp.parse().map_err(|_| {
        AppError::SignatureVerification("non-numeric timestamp".to_string())
    })?;
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::SignatureVerification(
            "timestamp outside tolerance window".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::SignatureVerification(format!("HMAC error: {}", e)))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // verify_slice compares in constant time.
    for candidate in &signatures {
        let decoded = match hex::decode(candidate) {
            Ok(bytes) => bytes,
            Err(_) => continue,
        };
        if mac.clone().verify_slice(&decoded).is_ok() {
            return Ok(());
        }
    }

    Err(AppError::SignatureVerification(
        "no matching v1 signature".to_string(),
    ))
}

/// Computes the `stripe-signature` header value for a payload. Test-only:
/// production signatures come from Stripe.
#[cfg(test)]
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
        let header = sign_payload(body, SECRET, NOW);
        assert!(verify_signature_at(body, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn flipped_body_byte_fails() {
        let body = b"{\"id\":\"evt_1\"}".to_vec();
        let header = sign_payload(&body, SECRET, NOW);

        let mut tampered = body.clone();
        tampered[5] ^= 0x01;
        assert!(verify_signature_at(&tampered, &header, SECRET, NOW).is_err());
    }

    #[test]
    fn wrong_secret_fails() {
        let body = b"{}";
        let header = sign_payload(body, "whsec_other", NOW);
        assert!(verify_signature_at(body, &header, SECRET, NOW).is_err());
    }

    #[test]
    fn stale_timestamp_fails() {
        let body = b"{}";
        let header = sign_payload(body, SECRET, NOW - SIGNATURE_TOLERANCE_SECS - 1);
        assert!(verify_signature_at(body, &header, SECRET, NOW).is_err());
    }

    #[test]
    fn timestamp_within_tolerance_verifies() {
        let body = b"{}";
        let header = sign_payload(body, SECRET, NOW - SIGNATURE_TOLERANCE_SECS + 10);
        assert!(verify_signature_at(body, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn malformed_header_fails() {
        assert!(verify_signature_at(b"{}", "v1=deadbeef", SECRET, NOW).is_err());
        assert!(verify_signature_at(b"{}", "t=123", SECRET, NOW).is_err());
        assert!(verify_signature_at(b"{}", "", SECRET, NOW).is_err());
    }

    #[test]
    fn non_hex_signature_fails_cleanly() {
        let body = b"{}";
        let header = format!("t={},v1=not-hex-at-all", NOW);
        assert!(verify_signature_at(body, &header, SECRET, NOW).is_err());

        // Valid hex of the wrong length must not match either.
        let header = format!("t={},v1=deadbeef", NOW);
        assert!(verify_signature_at(body, &header, SECRET, NOW).is_err());
    }

    #[test]
    fn extra_unknown_schemes_are_ignored() {
        let body = b"{}";
        let header = format!("{},v0=garbage", sign_payload(body, SECRET, NOW));
        assert!(verify_signature_at(body, &header, SECRET, NOW).is_ok());
    }
}
