//! Application State

use std::sync::Arc;

use checkout_payments::Gateway;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout gateway; read-only after startup
    pub gateway: Arc<Gateway>,

    /// `test` or `live`, shown on pages and in the health check
    pub provider_mode: &'static str,
}

impl AppState {
    pub fn new(gateway: Gateway, provider_mode: &'static str) -> Self {
        Self {
            gateway: Arc::new(gateway),
            provider_mode,
        }
    }
}
