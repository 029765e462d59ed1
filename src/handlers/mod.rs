pub mod intent_handlers;
pub mod transaction_handlers;
pub mod webhook_handlers;
