//! Checkout Gateway
//!
//! The four operations exposed over HTTP. Each one is a single stateless
//! exchange with the provider; the gateway itself holds only read-only
//! configuration.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::checkout::{CheckoutSession, CheckoutSessionParams, PaymentProvider, PortalSession, SessionDetails};
use crate::error::{PaymentError, Result};
use crate::plan::PlanCatalog;
use crate::webhook::{WebhookEvent, WebhookHandler};

/// Placeholder the provider replaces with the session id on redirect
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Default bound on a single provider call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway settings, fixed at startup
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Externally reachable base URL, without trailing slash
    pub base_url: String,

    pub provider_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn success_url(&self) -> String {
        format!("{}/success?session_id={SESSION_ID_PLACEHOLDER}", self.base_url)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/cancel", self.base_url)
    }

    /// Where the billing portal sends the customer back to. Only a
    /// well-formed session id is carried into the URL.
    pub fn portal_return_url(&self, session_id: Option<&str>) -> String {
        match session_id.filter(|id| is_session_id(id)) {
            Some(id) => format!("{}/success?session_id={id}", self.base_url),
            None => format!("{}/", self.base_url),
        }
    }
}

/// Incoming subscribe request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Plan identifier as sent by the browser
    #[serde(default)]
    pub plan: Option<String>,

    /// Optional email to pre-fill on the checkout page
    #[serde(default, alias = "email")]
    pub customer_email: Option<String>,
}

/// Checkout gateway
pub struct Gateway {
    provider: Arc<dyn PaymentProvider>,
    catalog: PlanCatalog,
    webhooks: WebhookHandler,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        catalog: PlanCatalog,
        webhooks: WebhookHandler,
        config: GatewayConfig,
    ) -> Self {
        Self {
            provider,
            catalog,
            webhooks,
            config,
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub const fn webhooks(&self) -> &WebhookHandler {
        &self.webhooks
    }

    /// Start a hosted subscription checkout for a catalog plan.
    pub async fn initiate_checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let name = non_blank(request.plan.as_deref()).ok_or_else(|| PaymentError::InvalidPlan(String::new()))?;
        let (plan, price_id) = self.catalog.resolve(name)?;

        let params = CheckoutSessionParams {
            plan,
            price_id: price_id.to_string(),
            customer_email: non_blank(request.customer_email.as_deref()).map(str::to_owned),
            success_url: self.config.success_url(),
            cancel_url: self.config.cancel_url(),
        };

        tracing::info!(plan = %plan, price_id, prefilled_email = params.customer_email.is_some(), "Creating checkout session");

        let session = self
            .bounded("create_checkout_session", self.provider.create_checkout_session(params))
            .await?;

        tracing::info!(session_id = %session.id, plan = %plan, "Checkout session created");
        Ok(session)
    }

    /// Look up the session the customer was sent back with.
    pub async fn confirm_success(&self, session_id: Option<&str>) -> Result<SessionDetails> {
        let session_id = non_blank(session_id).ok_or(PaymentError::MissingSessionId)?;
        if !is_session_id(session_id) {
            tracing::warn!(session_id, "Ignoring malformed checkout session id");
            return Err(PaymentError::MissingSessionId);
        }

        self.bounded(
            "retrieve_checkout_session",
            self.provider.retrieve_checkout_session(session_id),
        )
        .await
    }

    /// Open the hosted billing portal for an existing customer.
    pub async fn open_billing_portal(
        &self,
        customer_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<PortalSession> {
        let customer_id = validate_customer_id(customer_id)?;
        let session_id = non_blank(session_id);
        if session_id.is_some_and(|id| !is_session_id(id)) {
            tracing::warn!(customer_id, "Dropping malformed session id from portal return URL");
        }
        let return_url = self.config.portal_return_url(session_id);

        let session = self
            .bounded(
                "create_portal_session",
                self.provider.create_portal_session(customer_id, &return_url),
            )
            .await?;

        tracing::info!(customer_id, portal_session = %session.id, "Billing portal session created");
        Ok(session)
    }

    /// Verify and acknowledge a webhook delivery.
    pub fn receive_webhook(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookEvent> {
        self.webhooks.process(payload, signature)
    }

    async fn bounded<T>(&self, operation: &'static str, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.config.provider_timeout, call)
            .await
            .map_err(|_| {
                tracing::warn!(operation, timeout = ?self.config.provider_timeout, "Provider call timed out");
                PaymentError::Provider(format!("{operation} timed out"))
            })?
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Checkout session ids look like `cs_` followed by ASCII alphanumerics
/// and underscores (`cs_test_a1B2`).
pub fn is_session_id(session_id: &str) -> bool {
    session_id
        .strip_prefix("cs_")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

/// Customer ids look like `cus_` followed by ASCII alphanumerics.
pub fn validate_customer_id(customer_id: Option<&str>) -> Result<&str> {
    let id = non_blank(customer_id).ok_or_else(|| PaymentError::InvalidCustomer("customer id not provided".into()))?;

    let well_formed = id
        .strip_prefix("cus_")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()));

    if well_formed {
        Ok(id)
    } else {
        Err(PaymentError::InvalidCustomer(id.to_string()))
    }
}
