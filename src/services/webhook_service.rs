// services/webhook_service.rs
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::models::event::{EventKind, WebhookEvent};
use crate::models::transaction::ConfirmedTransaction;
use crate::services::email_service::NotificationSender;
use crate::store::TransactionStore;

/// Upper bound on how long the acknowledgement path waits for the store.
/// Stripe times out webhook deliveries after a few seconds; a slow append
/// is logged and the event is still acknowledged.
const APPEND_TIMEOUT: Duration = Duration::from_secs(5);

/// What a dispatch did, for logging and tests. Dispatch itself never
/// fails: every downstream error is absorbed here so the webhook response
/// only ever reflects verification, not side-effect health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub kind: EventKind,
    pub recorded: bool,
    pub notified: bool,
}

/// Routes verified webhook events to their side effects. Each event is
/// processed solely on its own embedded intent id; no ordering across
/// deliveries is assumed, since Stripe gives none.
pub struct WebhookDispatcher {
    store: Arc<dyn TransactionStore>,
    sender: Arc<dyn NotificationSender>,
}

impl WebhookDispatcher {
    pub fn new(store: Arc<dyn TransactionStore>, sender: Arc<dyn NotificationSender>) -> Self {
        WebhookDispatcher { store, sender }
    }

    pub async fn dispatch(&self, event: WebhookEvent) -> DispatchOutcome {
        let kind = event.kind();
        let intent = &event.data.object;

        match kind {
            EventKind::Succeeded => {
                let tx = ConfirmedTransaction::from_intent(intent);
                let email = tx.customer_email.clone();

                let recorded = self.record(&tx).await;

                // Independent of the append outcome: an unrecorded
                // transaction is not a reason to withhold the receipt.
                let notified = match self.sender.send_confirmation(&email, &tx).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(intent_id = %tx.id, "confirmation email failed: {}", e);
                        false
                    }
                };

                DispatchOutcome { kind, recorded, notified }
            }
            EventKind::Failed => {
                let tx = ConfirmedTransaction::from_intent(intent);
                let notified = match self
                    .sender
                    .send_failure_notice(&tx.customer_email, &tx)
                    .await
                {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(intent_id = %tx.id, "failure notice failed: {}", e);
                        false
                    }
                };
                // Failed payments are never recorded.
                DispatchOutcome { kind, recorded: false, notified }
            }
            EventKind::Other => {
                info!(event_id = %event.id, event_type = %event.event_type, "ignoring event");
                DispatchOutcome { kind, recorded: false, notified: false }
            }
        }
    }

    async fn record(&self, tx: &ConfirmedTransaction) -> bool {
        match tokio::time::timeout(APPEND_TIMEOUT, self.store.append(tx.clone())).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                // Logged, not propagated: a 200 still goes back to Stripe
                // so a store outage does not turn into a retry storm. The
                // unrecorded-transaction risk is accepted and documented.
                error!(operation = "append", intent_id = %tx.id, "store append failed: {}", e);
                false
            }
            Err(_) => {
                error!(operation = "append", intent_id = %tx.id, "store append timed out");
                false
            }
        }
    }
}
