use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{intent_handlers, transaction_handlers, webhook_handlers};
use crate::state::AppState;

/// The checkout API surface. Paths are a contract with the client UI.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/charge-intent",
            post(intent_handlers::create_charge_intent)
                .get(intent_handlers::retrieve_charge_intent),
        )
        .route("/pricing", get(intent_handlers::get_pricing))
        .route("/webhook", post(webhook_handlers::handle_webhook))
        .route(
            "/transactions",
            get(transaction_handlers::list_transactions),
        )
}
