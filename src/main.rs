use axum::extract::State;
use axum::{http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod database;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
mod store;

use config::AppConfig;
use services::email_service::{NotificationSender, SendGridSender};
use services::stripe_service::StripeService;
use services::webhook_service::WebhookDispatcher;
use state::AppState;
use store::{FileStore, MongoStore, TransactionStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env();
    let (host, port) = (config.host.clone(), config.port);
    let app_state = initialize_app_state(config).await;

    let app = build_router(app_state);
    start_server(app, &host, port).await;
}

async fn initialize_app_state(config: AppConfig) -> AppState {
    let store = select_store(&config).await;
    tracing::info!("✅ Transaction store ready ({})", store.backend());

    let sender: Arc<dyn NotificationSender> = Arc::new(SendGridSender::new(
        config.sendgrid_api_key.clone(),
        config.sendgrid_from_email.clone(),
    ));
    if config.email_configured() {
        tracing::info!("✅ SendGrid notification sender configured");
    } else {
        tracing::warn!("SendGrid not configured, notification emails will be skipped");
    }

    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set, webhook deliveries will be rejected");
    }

    let dispatcher = Arc::new(WebhookDispatcher::new(store.clone(), sender));

    let mut app_state = AppState::new(config.clone(), store, dispatcher);

    match &config.stripe_secret_key {
        Some(secret_key) => match StripeService::new(secret_key.clone()) {
            Ok(stripe) => {
                tracing::info!("✅ Stripe service initialized");
                app_state = app_state.with_stripe(Arc::new(stripe));
            }
            Err(e) => {
                tracing::error!("❌ Failed to initialize Stripe service: {}", e);
                tracing::warn!("Charge-intent endpoints will be disabled");
            }
        },
        None => {
            tracing::error!("❌ STRIPE_SECRET_KEY not set");
            tracing::warn!("Charge-intent endpoints will be disabled");
        }
    }

    app_state
}

/// MongoDB when configured and reachable, otherwise the file fallback.
/// The choice is made once at startup; both satisfy the same contract.
async fn select_store(config: &AppConfig) -> Arc<dyn TransactionStore> {
    if let Some(uri) = config.mongodb_connection_string() {
        match database::connection::connect(&uri, &config.mongodb_db_name).await {
            Ok(db) => match MongoStore::new(db).await {
                Ok(store) => return Arc::new(store),
                Err(e) => {
                    tracing::error!("❌ Failed to prepare transactions collection: {}", e);
                    tracing::warn!("Falling back to the file store");
                }
            },
            Err(e) => {
                tracing::error!("❌ MongoDB connection failed: {}", e);
                tracing::warn!("Falling back to the file store");
            }
        }
    }

    let path = config.transactions_file.clone().map(PathBuf::from);
    match FileStore::load(path).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            // Unreadable or corrupt file: start empty in memory rather
            // than refuse to serve webhooks at all.
            tracing::error!("❌ Failed to load transaction file: {}", e);
            Arc::new(
                FileStore::load(None)
                    .await
                    .expect("memory store cannot fail to load"),
            )
        }
    }
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .merge(routes::payments::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn start_server(app: Router, host: &str, port: u16) {
    let ip = host
        .parse::<std::net::IpAddr>()
        .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0]));
    let addr = SocketAddr::from((ip, port));

    tracing::info!("🚀 Server starting on {}", addr);

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    }
}

async fn root_handler() -> &'static str {
    "💳 Checkout API"
}

/// Always 200: reports configuration completeness so operators spot a
/// missing credential before it surfaces as a user-facing failure.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": state.config.env_check(),
        "services": {
            "stripe": state.stripe.is_some(),
            "webhook": state.config.stripe_webhook_secret.is_some(),
            "email": state.config.email_configured(),
            "store": state.store.backend(),
        },
    }))
}
