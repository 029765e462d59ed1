use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::stripe_service::StripeService;
use crate::services::webhook_service::WebhookDispatcher;
use crate::store::TransactionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn TransactionStore>,
    pub dispatcher: Arc<WebhookDispatcher>,
    /// Absent when STRIPE_SECRET_KEY is unconfigured; the charge-intent
    /// endpoints then fail fast with a configuration error.
    pub stripe: Option<Arc<StripeService>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn TransactionStore>,
        dispatcher: Arc<WebhookDispatcher>,
    ) -> Self {
        AppState {
            config,
            store,
            dispatcher,
            stripe: None,
        }
    }

    pub fn with_stripe(mut self, stripe: Arc<StripeService>) -> Self {
        self.stripe = Some(stripe);
        self
    }
}
