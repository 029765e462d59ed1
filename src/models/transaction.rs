// models/transaction.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::event::IntentObject;

/// Email sentinel stored when neither the intent metadata nor the
/// receipt email carried an address.
pub const NO_EMAIL: &str = "no-email";

/// Durable record of one successful payment. `id` is the payment intent
/// id — the natural key that makes webhook redelivery idempotent. Records
/// are append-only: never mutated, never deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmedTransaction {
    pub id: String,

    /// Minor currency units (cents).
    pub amount: i64,
    pub currency: String,
    pub customer_email: String,

    /// When this record was created, not when the payment happened.
    pub timestamp: DateTime<Utc>,

    /// Round-tripped audit data (original code and amount) set at intent
    /// creation time.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ConfirmedTransaction {
    pub fn from_intent(intent: &IntentObject) -> Self {
        ConfirmedTransaction {
            id: intent.id.clone(),
            amount: intent.amount,
            currency: intent.currency.clone(),
            customer_email: intent.customer_email(),
            timestamp: Utc::now(),
            metadata: intent.metadata.clone(),
        }
    }
}
