//! Stripe Webhook Handling
//!
//! Verifies webhook signatures over the raw request body and dispatches the
//! event kinds we care about. Handling is acknowledgement only: every event
//! produces one log line and nothing is stored, so redelivered events are
//! harmless.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum age of a signed timestamp, same as the Stripe SDKs
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// Raw event envelope as delivered by Stripe
#[derive(Clone, Debug, Deserialize)]
pub struct EventEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// Event kinds with a dedicated handler arm
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    CheckoutSessionCompleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaid,
    InvoicePaymentFailed,
    Unknown,
}

impl EventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.paid" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => Self::Unknown,
        }
    }
}

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout completed, the provider now holds the subscription
    CheckoutCompleted {
        session_id: String,
        customer_email: Option<String>,
        plan: Option<String>,
    },

    SubscriptionCreated {
        subscription_id: String,
        customer_id: Option<String>,
    },

    SubscriptionUpdated {
        subscription_id: String,
        status: Option<String>,
    },

    SubscriptionCancelled {
        subscription_id: String,
    },

    InvoicePaid {
        invoice_id: String,
    },

    /// Payment failed, the provider handles dunning
    PaymentFailed {
        invoice_id: String,
        customer_email: Option<String>,
    },

    /// Unhandled event type, still acknowledged
    Other {
        event_type: String,
    },
}

impl WebhookEvent {
    /// Map a verified envelope onto our event type
    pub fn from_envelope(envelope: &EventEnvelope) -> Self {
        let object = &envelope.data.object;
        let id = || str_field(object, "id").unwrap_or_default();

        match EventKind::from_type(&envelope.event_type) {
            EventKind::CheckoutSessionCompleted => Self::CheckoutCompleted {
                session_id: id(),
                customer_email: object
                    .get("customer_details")
                    .and_then(|details| str_field(details, "email"))
                    .or_else(|| str_field(object, "customer_email")),
                plan: object
                    .get("metadata")
                    .and_then(|m| str_field(m, crate::checkout::PLAN_METADATA_KEY)),
            },
            EventKind::SubscriptionCreated => Self::SubscriptionCreated {
                subscription_id: id(),
                customer_id: str_field(object, "customer"),
            },
            EventKind::SubscriptionUpdated => Self::SubscriptionUpdated {
                subscription_id: id(),
                status: str_field(object, "status"),
            },
            EventKind::SubscriptionDeleted => Self::SubscriptionCancelled {
                subscription_id: id(),
            },
            EventKind::InvoicePaid => Self::InvoicePaid { invoice_id: id() },
            EventKind::InvoicePaymentFailed => Self::PaymentFailed {
                invoice_id: id(),
                customer_email: str_field(object, "customer_email"),
            },
            EventKind::Unknown => Self::Other {
                event_type: envelope.event_type.clone(),
            },
        }
    }

    pub const fn is_handled(&self) -> bool {
        !matches!(self, Self::Other { .. })
    }
}

fn str_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key).and_then(serde_json::Value::as_str).map(str::to_owned)
}

/// Stripe-Signature verification
#[derive(Clone, Debug)]
pub struct WebhookVerifier {
    secret: Option<String>,
    tolerance: Duration,
}

impl WebhookVerifier {
    /// Without a secret every webhook is rejected.
    pub const fn new(secret: Option<String>) -> Self {
        Self {
            secret,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub const fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify against the current time
    pub fn verify(&self, payload: &[u8], header: Option<&str>) -> Result<()> {
        self.verify_at(payload, header, Utc::now().timestamp())
    }

    /// Verify `header` (`t=<unix>,v1=<hex>[,v1=<hex>...]`) over the exact
    /// bytes of `payload`.
    pub fn verify_at(&self, payload: &[u8], header: Option<&str>, now: i64) -> Result<()> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| reject("webhook secret not configured"))?;
        let header = header.ok_or_else(|| reject("missing signature header"))?;

        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                "v1" => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| reject("missing or malformed timestamp"))?;
        if signatures.is_empty() {
            return Err(reject("no v1 signature"));
        }

        if now.abs_diff(timestamp) > self.tolerance.as_secs() {
            return Err(reject("timestamp outside tolerance window"));
        }

        let mac = signed_payload_mac(secret, timestamp, payload)?;
        let matched = signatures
            .iter()
            .filter_map(|sig| hex::decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            Err(reject("no matching signature"))
        }
    }
}

fn signed_payload_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| reject(&e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

fn reject(reason: &str) -> PaymentError {
    PaymentError::WebhookVerification(reason.to_string())
}

/// Webhook handler
#[derive(Clone, Debug)]
pub struct WebhookHandler {
    verifier: WebhookVerifier,
}

impl WebhookHandler {
    pub const fn new(verifier: WebhookVerifier) -> Self {
        Self { verifier }
    }

    pub const fn verifier(&self) -> &WebhookVerifier {
        &self.verifier
    }

    /// Verify signature and parse event. Nothing is parsed before the
    /// signature checks out.
    pub fn parse_event(&self, payload: &[u8], signature: Option<&str>) -> Result<EventEnvelope> {
        self.verifier.verify(payload, signature)?;
        serde_json::from_slice(payload).map_err(|e| PaymentError::WebhookParse(e.to_string()))
    }

    /// Verify, parse and acknowledge a delivery
    pub fn process(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookEvent> {
        let envelope = self.parse_event(payload, signature)?;
        let event = WebhookEvent::from_envelope(&envelope);
        Self::handle(&envelope.id, &event);
        Ok(event)
    }

    /// Acknowledge an event. Logging only.
    pub fn handle(event_id: &str, event: &WebhookEvent) {
        match event {
            WebhookEvent::CheckoutCompleted {
                session_id,
                customer_email,
                plan,
            } => {
                tracing::info!(
                    event_id,
                    session_id = %session_id,
                    email = ?customer_email,
                    plan = ?plan,
                    "Checkout completed"
                );
            }

            WebhookEvent::SubscriptionCreated {
                subscription_id,
                customer_id,
            } => {
                tracing::info!(
                    event_id,
                    subscription_id = %subscription_id,
                    customer_id = ?customer_id,
                    "Subscription created"
                );
            }

            WebhookEvent::SubscriptionUpdated { subscription_id, status } => {
                tracing::info!(
                    event_id,
                    subscription_id = %subscription_id,
                    status = ?status,
                    "Subscription updated"
                );
            }

            WebhookEvent::SubscriptionCancelled { subscription_id } => {
                tracing::info!(event_id, subscription_id = %subscription_id, "Subscription cancelled");
            }

            WebhookEvent::InvoicePaid { invoice_id } => {
                tracing::info!(event_id, invoice_id = %invoice_id, "Invoice paid");
            }

            WebhookEvent::PaymentFailed {
                invoice_id,
                customer_email,
            } => {
                tracing::warn!(
                    event_id,
                    invoice_id = %invoice_id,
                    email = ?customer_email,
                    "Payment failed"
                );
            }

            WebhookEvent::Other { event_type } => {
                tracing::info!(event_id, event_type = %event_type, "Unhandled webhook event");
            }
        }
    }
}
