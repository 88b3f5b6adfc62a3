//! HTTP Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use checkout_payments::{CheckoutRequest, PaymentError, SIGNATURE_HEADER};
use minijinja::context;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::pages;
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PortalQuery {
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Checkout session to return to after the portal
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub mode: &'static str,
    pub base_url: String,
    pub webhooks_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Landing page with the available plans
pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let html = pages::render(
        "index.html",
        context! {
            plans => state.gateway.catalog().listings(),
            mode => state.provider_mode,
        },
    )?;
    Ok(html)
}

/// Start a subscription checkout and send the browser to Stripe
pub async fn subscribe(
    State(state): State<AppState>,
    Query(request): Query<CheckoutRequest>,
) -> AppResult<Redirect> {
    let session = state.gateway.initiate_checkout(request).await?;
    Ok(Redirect::to(&session.checkout_url))
}

/// Confirmation page after a completed checkout.
///
/// Without a session id the visitor goes back home. A failed lookup shows
/// the error page.
pub async fn success(
    State(state): State<AppState>,
    Query(query): Query<SuccessQuery>,
) -> AppResult<Response> {
    let details = match state.gateway.confirm_success(query.session_id.as_deref()).await {
        Ok(details) => details,
        Err(PaymentError::MissingSessionId) => return Ok(Redirect::to("/").into_response()),
        Err(e) => return Err(e.into()),
    };

    let html = pages::render(
        "success.html",
        context! {
            session_id => details.id,
            customer_email => details.customer_email,
            plan_name => details.plan_name,
            customer_id => details.customer_id,
            mode => state.provider_mode,
        },
    )?;
    Ok(html.into_response())
}

pub async fn cancel(State(state): State<AppState>) -> AppResult<Html<String>> {
    Ok(pages::render("cancel.html", context! { mode => state.provider_mode })?)
}

/// Billing portal, customer id from the query string
pub async fn customer_portal(
    State(state): State<AppState>,
    Query(query): Query<PortalQuery>,
) -> AppResult<Redirect> {
    open_portal(&state, query.customer_id.as_deref(), query.session_id.as_deref()).await
}

/// Billing portal, customer id from the path
pub async fn customer_portal_by_path(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Query(query): Query<PortalQuery>,
) -> AppResult<Redirect> {
    open_portal(&state, Some(&customer_id), query.session_id.as_deref()).await
}

async fn open_portal(
    state: &AppState,
    customer_id: Option<&str>,
    session_id: Option<&str>,
) -> AppResult<Redirect> {
    let portal = state.gateway.open_billing_portal(customer_id, session_id).await?;
    Ok(Redirect::to(&portal.url))
}

/// Stripe webhook handler. Takes the body as raw bytes so the signature is
/// checked against exactly what Stripe sent.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    let event = state.gateway.receive_webhook(&body, signature)?;
    tracing::debug!(handled = event.is_handled(), "Webhook acknowledged");

    Ok(Json(WebhookAck { received: true }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        mode: state.provider_mode,
        base_url: state.gateway.config().base_url.clone(),
        webhooks_configured: state.gateway.webhooks().verifier().is_configured(),
    })
}

pub async fn not_found() -> Response {
    pages::error_page(
        StatusCode::NOT_FOUND,
        "Page Not Found",
        "The requested page does not exist.",
    )
}
