//! Quill Billing Core - Billing business logic
//!
//! Stripe integration, webhook ingestion, and the subscription/entitlement
//! lifecycle.
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_billing_core::{BillingConfig, BillingService, StripeProvider, WebhookHandler};
//!
//! let config = BillingConfig::new("sk_test_...", "whsec_...")
//!     .with_price(Plan::Pro, "price_...");
//!
//! let provider = Arc::new(StripeProvider::new(config.clone()));
//! let billing = BillingService::new(subscriptions, provider, WebhookHandler::new(&config.stripe_webhook_secret));
//!
//! let sub = billing.get_subscription(&user_id).await?;
//! let session = billing.create_checkout(&user_id, "alex@example.com", Plan::Pro).await?;
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod service;
pub mod stripe;
pub mod webhook;

pub use config::BillingConfig;
pub use error::BillingError;
pub use provider::{CheckoutSession, PaymentProvider};
pub use service::BillingService;
pub use stripe::StripeProvider;
pub use webhook::{
    mutation_for_event, EntitlementMutation, WebhookEvent, WebhookEventData, WebhookEventType,
    WebhookHandler,
};
