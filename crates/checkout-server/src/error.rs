//! Error types for the checkout server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout_payments::PaymentError;
use serde::Serialize;

use crate::pages;

/// JSON error body, used where the caller is a machine (webhooks)
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Payment(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Payment(_) | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Payment(PaymentError::InvalidPlan(_)) => "INVALID_PLAN",
            Self::Payment(PaymentError::InvalidCustomer(_)) => "INVALID_CUSTOMER",
            Self::Payment(PaymentError::MissingSessionId) => "MISSING_SESSION_ID",
            Self::Payment(PaymentError::Provider(_)) => "PROVIDER_ERROR",
            Self::Payment(PaymentError::WebhookVerification(_)) => "INVALID_SIGNATURE",
            Self::Payment(PaymentError::WebhookParse(_)) => "INVALID_PAYLOAD",
            Self::Template(_) => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Payment(PaymentError::InvalidPlan(_)) => "Invalid Plan",
            Self::Payment(PaymentError::InvalidCustomer(_)) => "Access Denied",
            Self::Payment(PaymentError::MissingSessionId) => "Missing Session",
            Self::Payment(PaymentError::Provider(_)) => "Payment Provider Error",
            Self::Payment(PaymentError::WebhookVerification(_) | PaymentError::WebhookParse(_)) => {
                "Webhook Error"
            }
            Self::Template(_) => "Server Error",
        }
    }

    fn user_message(&self) -> &str {
        match self {
            Self::Payment(e) => e.user_message(),
            Self::Template(_) => "Something went wrong on our end.",
        }
    }

    const fn is_webhook_error(&self) -> bool {
        matches!(
            self,
            Self::Payment(PaymentError::WebhookVerification(_) | PaymentError::WebhookParse(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        if self.is_webhook_error() {
            let body = ErrorResponse {
                error: self.to_string(),
                code: self.error_code().to_string(),
            };
            return (status, Json(body)).into_response();
        }

        pages::error_page(status, self.title(), self.user_message())
    }
}

/// Result type for handlers
pub type AppResult<T> = Result<T, AppError>;
