//! Billing configuration

use quill_types::Plan;
use std::collections::HashMap;

/// Billing service configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
    /// Map of plans to Stripe price IDs. Plans without a price cannot be
    /// checked out.
    pub price_ids: HashMap<Plan, String>,
    /// Success redirect URL for checkout
    pub success_url: String,
    /// Cancel redirect URL for checkout
    pub cancel_url: String,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(
        stripe_secret_key: impl Into<String>,
        stripe_webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            stripe_secret_key: stripe_secret_key.into(),
            stripe_webhook_secret: stripe_webhook_secret.into(),
            price_ids: HashMap::new(),
            success_url: "https://app.example.com/dashboard?payment=success".to_string(),
            cancel_url: "https://app.example.com/pricing".to_string(),
        }
    }

    /// Set the price ID for a plan
    pub fn with_price(mut self, plan: Plan, price_id: impl Into<String>) -> Self {
        self.price_ids.insert(plan, price_id.into());
        self
    }

    /// Set redirect URLs
    pub fn with_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self
    }

    /// Get the price ID for a plan
    pub fn price_id(&self, plan: Plan) -> Option<&str> {
        self.price_ids.get(&plan).map(String::as_str)
    }
}
