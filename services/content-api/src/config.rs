//! Configuration for the Content API service.

use std::time::Duration;

use quill_billing_core::BillingConfig;
use quill_types::Plan;

/// Content API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Billing core configuration
    pub billing: BillingConfig,
    /// Gemini API key
    pub gemini_api_key: String,
    /// Gemini model name
    pub gemini_model: String,
    /// Timeout for a single generation call
    pub generation_timeout: Duration,
    /// Request timeout for the HTTP server
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Generation backend
        let gemini_api_key =
            std::env::var("GEMINI_API_KEY").map_err(|_| ConfigError::Missing("GEMINI_API_KEY"))?;
        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let generation_timeout_secs: u64 = std::env::var("GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("GENERATION_TIMEOUT_SECS"))?;

        // Stripe
        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?;
        let stripe_webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;

        // Checkout redirect targets
        let app_url =
            std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let mut billing = BillingConfig::new(stripe_secret_key, stripe_webhook_secret).with_urls(
            format!("{app_url}/dashboard?payment=success&session_id={{CHECKOUT_SESSION_ID}}"),
            format!("{app_url}/pricing"),
        );
        // Plans without a configured price simply cannot be checked out.
        if let Ok(price_id) = std::env::var("STRIPE_PRO_PRICE_ID") {
            billing = billing.with_price(Plan::Pro, price_id);
        }
        if let Ok(price_id) = std::env::var("STRIPE_TEAM_PRICE_ID") {
            billing = billing.with_price(Plan::Team, price_id);
        }

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            http_port,
            billing,
            gemini_api_key,
            gemini_model,
            generation_timeout: Duration::from_secs(generation_timeout_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
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
