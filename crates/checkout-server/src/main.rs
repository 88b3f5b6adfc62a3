//! checkout-gateway HTTP Server
//!
//! Axum-based server for Stripe subscription checkout, the billing portal
//! and webhook notifications.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_payments::{Gateway, StripeClient, WebhookHandler, WebhookVerifier};
use checkout_server::{
    AppState,
    config::{self, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    if !config::is_production(std::env::var("APP_ENV").ok().as_deref()) {
        dotenvy::dotenv().ok();
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().inspect_err(|e| {
        tracing::error!("{e}");
        tracing::error!("  Set STRIPE_SECRET_KEY in the environment or .env");
    })?;
    tracing::debug!(?config, "Loaded configuration");

    // Initialize payments
    let stripe = Arc::new(StripeClient::new(&config.stripe_secret_key));
    let webhooks = WebhookHandler::new(WebhookVerifier::new(config.stripe_webhook_secret.clone()));
    let gateway = Gateway::new(stripe, config.plan_catalog(), webhooks, config.gateway_config());

    let mode = config.provider_mode();
    tracing::info!("✓ Stripe configured ({} mode)", mode.to_uppercase());

    let state = AppState::new(gateway, mode);
    let app = checkout_server::app(state, &config.static_dir);

    // Start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 checkout-server running on http://{}", addr);
    tracing::info!("   public URL: {}", config.base_url);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  GET  /                       - Plans");
    tracing::info!("  GET  /subscribe?plan=        - Start checkout");
    tracing::info!("  GET  /success?session_id=    - Checkout confirmation");
    tracing::info!("  GET  /cancel                 - Checkout cancelled");
    tracing::info!("  GET  /customer-portal        - Billing portal");
    tracing::info!("  POST /webhook                - Stripe webhooks");
    tracing::info!("");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
