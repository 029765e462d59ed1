pub mod email_service;
pub mod pricing;
pub mod stripe_service;
pub mod webhook_service;
