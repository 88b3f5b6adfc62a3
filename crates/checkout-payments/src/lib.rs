//! # checkout-payments
//!
//! Subscription checkout for checkout-gateway, built on Stripe Checkout
//! (Hosted).
//!
//! **Flow:** Your site → Redirect to Stripe's hosted page → Redirect back
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Your Site  │────▶│  Stripe Hosted  │────▶│  Your Site  │
//! │ (/subscribe)│     │  Checkout Page  │     │  (/success) │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//!                              │
//!                              ▼ signed webhook
//!                     ┌─────────────────┐
//!                     │    /webhook     │
//!                     └─────────────────┘
//! ```
//!
//! Nothing about customers or subscriptions is stored here; Stripe is the
//! only source of truth.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use checkout_payments::{
//!     CheckoutRequest, Gateway, GatewayConfig, PlanCatalog, StripeClient,
//!     WebhookHandler, WebhookVerifier,
//! };
//!
//! let gateway = Gateway::new(
//!     Arc::new(StripeClient::new("sk_test_xxx")),
//!     PlanCatalog::default(),
//!     WebhookHandler::new(WebhookVerifier::new(Some("whsec_xxx".into()))),
//!     GatewayConfig::new("https://yoursite.com"),
//! );
//!
//! let session = gateway.initiate_checkout(CheckoutRequest {
//!     plan: Some("pro".into()),
//!     customer_email: Some("user@example.com".into()),
//! }).await?;
//!
//! // Redirect user to: session.checkout_url
//! ```

mod checkout;
mod error;
mod gateway;
mod plan;
mod webhook;

pub use checkout::{
    CheckoutSession, CheckoutSessionParams, PLAN_METADATA_KEY, PaymentProvider, PortalSession,
    SessionDetails, StripeClient,
};
pub use error::{PaymentError, Result};
pub use gateway::{
    CheckoutRequest, DEFAULT_PROVIDER_TIMEOUT, Gateway, GatewayConfig, SESSION_ID_PLACEHOLDER,
    is_session_id, validate_customer_id,
};
pub use plan::{DEFAULT_PRO_PRICE, DEFAULT_STARTER_PRICE, Plan, PlanCatalog, PlanListing};
pub use webhook::{
    DEFAULT_TOLERANCE, EventEnvelope, EventKind, SIGNATURE_HEADER, WebhookEvent, WebhookHandler,
    WebhookVerifier,
};
