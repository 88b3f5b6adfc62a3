//! Shared fixtures for router tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

use checkout_payments::{
    CheckoutSession, CheckoutSessionParams, Gateway, GatewayConfig, PaymentError, PaymentProvider,
    PlanCatalog, PortalSession, Result, SessionDetails, WebhookHandler, WebhookVerifier,
};
use checkout_server::AppState;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret_key";
pub const BASE_URL: &str = "https://shop.example.com";
pub const CHECKOUT_URL: &str = "https://checkout.stripe.com/c/pay/cs_test_abc";
pub const PORTAL_URL: &str = "https://billing.stripe.com/p/session/test_portal";

/// Provider double that records every call
#[derive(Default)]
pub struct MockProvider {
    pub checkouts: Mutex<Vec<CheckoutSessionParams>>,
    pub lookups: Mutex<Vec<String>>,
    pub portals: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl MockProvider {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.checkouts.lock().unwrap().len()
            + self.lookups.lock().unwrap().len()
            + self.portals.lock().unwrap().len()
    }

    fn outcome<T>(&self, value: T) -> Result<T> {
        if self.fail {
            Err(PaymentError::Provider("simulated outage".into()))
        } else {
            Ok(value)
        }
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_checkout_session(&self, params: CheckoutSessionParams) -> Result<CheckoutSession> {
        self.checkouts.lock().unwrap().push(params);
        self.outcome(CheckoutSession {
            id: "cs_test_abc".into(),
            checkout_url: CHECKOUT_URL.into(),
        })
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<SessionDetails> {
        self.lookups.lock().unwrap().push(session_id.to_string());
        self.outcome(SessionDetails {
            id: session_id.to_string(),
            customer_email: Some("buyer@example.com".into()),
            plan_name: Some("pro".into()),
            customer_id: Some("cus_Test123".into()),
            subscription_id: Some("sub_Test123".into()),
        })
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<PortalSession> {
        self.portals
            .lock()
            .unwrap()
            .push((customer_id.to_string(), return_url.to_string()));
        self.outcome(PortalSession {
            id: "bps_test".into(),
            url: PORTAL_URL.into(),
        })
    }
}

pub fn app_with(provider: Arc<MockProvider>, webhook_secret: Option<&str>) -> Router {
    let gateway = Gateway::new(
        provider,
        PlanCatalog::default(),
        WebhookHandler::new(WebhookVerifier::new(webhook_secret.map(str::to_owned))),
        GatewayConfig::new(BASE_URL),
    );
    checkout_server::app(AppState::new(gateway, "test"), Path::new("tests/no-static-files"))
}

pub fn app(provider: Arc<MockProvider>) -> Router {
    app_with(provider, Some(WEBHOOK_SECRET))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_webhook(app: Router, payload: Vec<u8>, signature: Option<&str>) -> Response<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        request = request.header("stripe-signature", signature);
    }
    app.oneshot(request.body(Body::from(payload)).unwrap())
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers().get("location").unwrap().to_str().unwrap()
}

/// Generate a valid Stripe webhook signature for testing
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("t={timestamp},v1={signature}")
}

pub fn sign_now(payload: &[u8]) -> String {
    sign(payload, WEBHOOK_SECRET, Utc::now().timestamp())
}

/// Generate a webhook payload for testing
pub fn webhook_payload(event_type: &str) -> Vec<u8> {
    let payload = serde_json::json!({
        "id": "evt_test_123",
        "type": event_type,
        "created": Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "sub_test_123",
                "customer": "cus_test_123",
                "status": "active"
            }
        }
    });
    serde_json::to_vec(&payload).unwrap()
}
