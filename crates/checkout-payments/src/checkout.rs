//! Stripe Checkout Integration
//!
//! Hosted checkout and billing portal sessions. The gateway only talks to
//! the provider through [`PaymentProvider`], which keeps the HTTP layer
//! testable without network access.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use stripe::{
    BillingPortalSession, CheckoutSession as StripeCheckoutSession, CheckoutSessionId,
    CheckoutSessionMode, Client, CreateBillingPortalSession, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CustomerId,
};

use crate::error::{PaymentError, Result};
use crate::plan::Plan;

/// Metadata key carrying the plan name on a checkout session
pub const PLAN_METADATA_KEY: &str = "plan_name";

/// Fields expanded when looking a session up for the success page
const SESSION_EXPAND: &[&str] = &["customer", "subscription"];

/// External payment provider capabilities used by the gateway
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted subscription checkout session.
    async fn create_checkout_session(&self, params: CheckoutSessionParams) -> Result<CheckoutSession>;

    /// Look up a checkout session with its customer and subscription expanded.
    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<SessionDetails>;

    /// Create a billing portal session for an existing customer.
    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<PortalSession>;
}

/// Request to create a checkout session, as built by the gateway
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionParams {
    /// Plan being purchased
    pub plan: Plan,

    /// Provider price for the plan
    pub price_id: String,

    /// Pre-filled customer email
    #[serde(default)]
    pub customer_email: Option<String>,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,
}

/// Result of creating a checkout session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Stripe session ID
    pub id: String,

    /// URL to redirect user to
    pub checkout_url: String,
}

/// Checkout session as seen from the success page
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDetails {
    pub id: String,
    pub customer_email: Option<String>,
    pub plan_name: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
}

/// Result of creating a billing portal session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(&self, request: CheckoutSessionParams) -> Result<CheckoutSession> {
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Subscription);
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.customer_email = request.customer_email.as_deref();

        let mut metadata = HashMap::new();
        metadata.insert(PLAN_METADATA_KEY.to_string(), request.plan.as_str().to_string());
        params.metadata = Some(metadata);

        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(request.price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]);

        let session = StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let checkout_url = session
            .url
            .ok_or_else(|| PaymentError::Provider("No checkout URL returned".into()))?;

        Ok(CheckoutSession {
            id: session.id.to_string(),
            checkout_url,
        })
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<SessionDetails> {
        let id: CheckoutSessionId = session_id
            .parse()
            .map_err(|_| PaymentError::MissingSessionId)?;

        let session = StripeCheckoutSession::retrieve(&self.client, &id, SESSION_EXPAND)
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let customer_email = session
            .customer_details
            .as_ref()
            .and_then(|details| details.email.clone())
            .or_else(|| session.customer_email.clone());

        Ok(SessionDetails {
            id: session.id.to_string(),
            customer_email,
            plan_name: session
                .metadata
                .as_ref()
                .and_then(|m| m.get(PLAN_METADATA_KEY))
                .cloned(),
            customer_id: session.customer.as_ref().map(|c| c.id().to_string()),
            subscription_id: session.subscription.as_ref().map(|s| s.id().to_string()),
        })
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<PortalSession> {
        let customer: CustomerId = customer_id
            .parse()
            .map_err(|_| PaymentError::InvalidCustomer(customer_id.to_string()))?;

        let mut params = CreateBillingPortalSession::new(customer);
        params.return_url = Some(return_url);

        let session = BillingPortalSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        Ok(PortalSession {
            id: session.id.to_string(),
            url: session.url,
        })
    }
}
