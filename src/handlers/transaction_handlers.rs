// handlers/transaction_handlers.rs
use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::errors::Result;
use crate::state::AppState;
use crate::store::TransactionStore;

/// GET /transactions — the full confirmed set, oldest first.
pub async fn list_transactions(State(state): State<AppState>) -> Result<Json<Value>> {
    let transactions = state.store.list_all().await?;

    let message = if transactions.is_empty() {
        "No transactions yet. Complete a payment to see data here."
    } else {
        "Transactions found."
    };

    Ok(Json(json!({
        "status": "success",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "transaction_count": transactions.len(),
        "transactions": transactions,
        "message": message,
    })))
}
