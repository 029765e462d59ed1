// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing stripe-signature header")]
    MissingSignature,

    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),

    #[error("Stripe error: {0}")]
    StripeError(String),

    #[error("Payment intent not found: {0}")]
    IntentNotFound(String),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("External API error: {0}")]
    ExternalApi(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string()),
            // Validation messages are safe to show verbatim (e.g. the
            // minimum-amount rule); everything else stays generic.
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MissingSignature => (
                StatusCode::BAD_REQUEST,
                "Missing stripe-signature header".to_string(),
            ),
            AppError::SignatureVerification(_) => (
                StatusCode::BAD_REQUEST,
                "Webhook signature verification failed".to_string(),
            ),
            AppError::StripeError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::IntentNotFound(_) => {
                (StatusCode::NOT_FOUND, "Payment intent not found".to_string())
            }
            AppError::EmailError(_) => (StatusCode::BAD_GATEWAY, "Email error".to_string()),
            AppError::ConfigurationError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
            ),
            AppError::ExternalApi(_) => {
                (StatusCode::BAD_GATEWAY, "External API error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(format!("JSON parsing error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApi(format!("HTTP request failed: {}", err))
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn stripe(msg: impl Into<String>) -> Self {
        AppError::StripeError(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn email(msg: impl Into<String>) -> Self {
        AppError::EmailError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
