// handlers/webhook_handlers.rs
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::config::AckMode;
use crate::errors::{AppError, Result};
use crate::models::event::WebhookEvent;
use crate::services::stripe_service::verify_signature;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// POST /webhook — verify, dispatch, acknowledge.
///
/// The body stays raw bytes until the signature over them has been
/// verified. Missing header and bad signature both reject with 400 before
/// any dispatch; an unconfigured signing secret is a 500. Once dispatch
/// has been attempted the response is 200 regardless of side-effect
/// outcomes, so a store or email hiccup never provokes a retry storm.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let secret = state
        .config
        .stripe_webhook_secret
        .as_ref()
        .ok_or_else(|| AppError::configuration("STRIPE_WEBHOOK_SECRET is not set"))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingSignature)?;

    verify_signature(&body, signature, secret)?;

    let event: WebhookEvent = serde_json::from_slice(&body)?;
    info!(
        event_id = %event.id,
        event_type = %event.event_type,
        created = event.created,
        "webhook verified"
    );

    match state.config.ack_mode {
        AckMode::Sync => {
            let outcome = state.dispatcher.dispatch(event).await;
            info!(?outcome, "webhook dispatched");
        }
        AckMode::Deferred => {
            // Acknowledge now; the response no longer reflects whether the
            // transaction was recorded.
            let dispatcher = state.dispatcher.clone();
            tokio::spawn(async move {
                let outcome = dispatcher.dispatch(event).await;
                info!(?outcome, "webhook dispatched (deferred)");
            });
        }
    }

    Ok(Json(json!({ "received": true })))
}
