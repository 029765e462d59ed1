// handlers/intent_handlers.rs
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::{AppError, Result};
use crate::services::pricing::{resolve_charge_amount, resolve_price, to_minor_units, ChargeRequest};
use crate::services::stripe_service::StripeService;
use crate::state::AppState;

use std::sync::Arc;

fn stripe_service(state: &AppState) -> Result<&Arc<StripeService>> {
    state
        .stripe
        .as_ref()
        .ok_or_else(|| AppError::configuration("STRIPE_SECRET_KEY is not set"))
}

/// POST /charge-intent — validates, resolves the amount and creates a
/// provider-side payment intent. Validation happens before any provider
/// call.
pub async fn create_charge_intent(
    State(state): State<AppState>,
    Json(request): Json<ChargeRequest>,
) -> Result<Json<Value>> {
    let stripe = stripe_service(&state)?;

    let amount = resolve_charge_amount(&request)?;
    let minor = to_minor_units(amount);
    info!(amount, minor, code = ?request.code, "creating charge intent");

    let client_secret = stripe
        .create_intent(minor, request.email.as_deref(), request.code.as_deref())
        .await?;

    Ok(Json(json!({ "clientSecret": client_secret })))
}

#[derive(Debug, Deserialize)]
pub struct RetrieveQuery {
    pub id: Option<String>,
}

/// GET /charge-intent?id= — reduced view of an intent for display.
pub async fn retrieve_charge_intent(
    State(state): State<AppState>,
    Query(query): Query<RetrieveQuery>,
) -> Result<Json<Value>> {
    let stripe = stripe_service(&state)?;

    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::invalid_data("id query parameter is required"))?;

    let intent = stripe.retrieve_intent(&id).await?;

    Ok(Json(json!({ "paymentIntent": intent })))
}

#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    pub code: Option<String>,
}

/// GET /pricing?code= — price lookup for the checkout form.
pub async fn get_pricing(Query(query): Query<PricingQuery>) -> Result<Json<Value>> {
    let code = query
        .code
        .ok_or_else(|| AppError::invalid_data("Code parameter is required"))?;

    let price = resolve_price(&code);

    Ok(Json(json!({
        "code": code,
        "price": price,
        "formatted_price": format!("${:.2}", price),
    })))
}
