//! Configuration for the checkout server.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use checkout_payments::{
    DEFAULT_PRO_PRICE, DEFAULT_PROVIDER_TIMEOUT, DEFAULT_STARTER_PRICE, GatewayConfig, PlanCatalog,
};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_STATIC_DIR: &str = "public";

/// Whether `.env` should be skipped for this `APP_ENV` value
pub fn is_production(app_env: Option<&str>) -> bool {
    app_env.is_some_and(|env| env.trim().eq_ignore_ascii_case("production"))
}

/// Server configuration
#[derive(Clone)]
pub struct Config {
    /// Stripe secret API key
    pub stripe_secret_key: String,
    /// Shared secret for webhook signatures; webhooks are rejected without it
    pub stripe_webhook_secret: Option<String>,
    /// Externally reachable base URL, without trailing slash
    pub base_url: String,
    /// HTTP listen port
    pub port: u16,
    /// HTTP listen host
    pub bind_addr: String,
    pub starter_price: String,
    pub pro_price: String,
    /// Upper bound on a single Stripe call
    pub provider_timeout: Duration,
    /// Directory served for unmatched GET requests
    pub static_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        // Stripe configuration
        let stripe_secret_key =
            var("STRIPE_SECRET_KEY").ok_or(ConfigError::Missing("STRIPE_SECRET_KEY"))?;

        let stripe_webhook_secret =
            var("STRIPE_WEBHOOK_SECRET").or_else(|| var("STRIPE_WEBHOOK_SECRET_KEY"));
        if stripe_webhook_secret.is_none() {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set - all webhooks will be rejected");
        }

        // Server
        let port = match var("PORT") {
            Some(port) => port.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => DEFAULT_PORT,
        };

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let base_url = var("BASE_URL").unwrap_or_else(|| {
            let fallback = format!("http://localhost:{port}");
            tracing::warn!(fallback = %fallback, "BASE_URL not set - using fallback");
            fallback
        });
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid("BASE_URL"));
        }
        let base_url = base_url.trim_end_matches('/').to_string();

        // Plans
        let starter_price = var("STRIPE_PRICE_STARTER").unwrap_or_else(|| DEFAULT_STARTER_PRICE.to_string());
        let pro_price = var("STRIPE_PRICE_PRO").unwrap_or_else(|| DEFAULT_PRO_PRICE.to_string());

        let provider_timeout = match var("PROVIDER_TIMEOUT_SECS") {
            Some(secs) => match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::Invalid("PROVIDER_TIMEOUT_SECS")),
            },
            None => DEFAULT_PROVIDER_TIMEOUT,
        };

        let static_dir = var("STATIC_DIR").map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from);

        Ok(Self {
            stripe_secret_key,
            stripe_webhook_secret,
            base_url,
            port,
            bind_addr,
            starter_price,
            pro_price,
            provider_timeout,
            static_dir,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// `test` for test-mode keys, `live` otherwise
    pub fn provider_mode(&self) -> &'static str {
        if self.stripe_secret_key.starts_with("sk_test_") || self.stripe_secret_key.starts_with("rk_test_") {
            "test"
        } else {
            "live"
        }
    }

    pub fn plan_catalog(&self) -> PlanCatalog {
        PlanCatalog::new(&self.starter_price, &self.pro_price)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(&self.base_url).with_provider_timeout(self.provider_timeout)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("stripe_secret_key", &"[redacted]")
            .field(
                "stripe_webhook_secret",
                &self.stripe_webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("base_url", &self.base_url)
            .field("port", &self.port)
            .field("bind_addr", &self.bind_addr)
            .field("starter_price", &self.starter_price)
            .field("pro_price", &self.pro_price)
            .field("provider_timeout", &self.provider_timeout)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
