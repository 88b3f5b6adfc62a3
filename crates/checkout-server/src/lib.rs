//! checkout-gateway HTTP server
//!
//! Axum router for the subscription checkout pages, the billing portal
//! redirect and the Stripe webhook.

pub mod config;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod state;

use std::path::Path;

use axum::{
    Router,
    handler::HandlerWithoutStateExt,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::handlers::{
    cancel, customer_portal, customer_portal_by_path, health_check, index, not_found, stripe_webhook,
    subscribe, success,
};
pub use crate::state::AppState;

/// Build the application router.
///
/// Unmatched requests fall through to static files in `static_dir`, then to
/// the 404 page. No layer touches request bodies, so `/webhook` sees the raw
/// bytes.
pub fn app(state: AppState, static_dir: &Path) -> Router {
    let static_files = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(not_found.into_service());

    Router::new()
        // Health
        .route("/health", get(health_check))

        // Pages
        .route("/", get(index))
        .route("/subscribe", get(subscribe))
        .route("/success", get(success))
        .route("/cancel", get(cancel))

        // Billing portal
        .route("/customer-portal", get(customer_portal))
        .route("/customer-portal/{customer_id}", get(customer_portal_by_path))

        // Stripe
        .route("/webhook", post(stripe_webhook))

        .fallback_service(static_files)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
