//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Plan identifier missing or not in the catalog
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// Customer identifier missing or malformed
    #[error("Invalid customer: {0}")]
    InvalidCustomer(String),

    /// Success callback arrived without a usable session id
    #[error("Missing checkout session id")]
    MissingSessionId,

    /// Provider call failed or timed out
    #[error("Provider error: {0}")]
    Provider(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookVerification(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),
}

impl PaymentError {
    /// Caller-side errors, answered with a 4xx.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Provider(_))
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::InvalidPlan(_) => "Please select a valid subscription plan.",
            Self::InvalidCustomer(_) => "A valid customer ID is required to open the billing portal.",
            Self::MissingSessionId => "No checkout session was provided.",
            Self::Provider(_) => "Payment processing failed. Please try again.",
            Self::WebhookVerification(_) | Self::WebhookParse(_) => "Webhook rejected.",
        }
    }
}
