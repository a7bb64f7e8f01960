//! Payment provider abstraction

use async_trait::async_trait;

use quill_types::{Plan, UserId};

use crate::BillingError;

/// An opaque checkout session created by the payment processor
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Processor-issued session ID the client redirects with
    pub session_id: String,
    /// Hosted checkout URL, when the processor returns one
    pub url: Option<String>,
}

/// Payment provider trait
///
/// Abstracts payment processing so the entitlement service never talks to
/// Stripe directly. The session must carry `user_id` and `plan` as metadata;
/// that channel is the only linkage between a checkout and the webhook that
/// later upgrades the subscription, and it must round-trip exactly.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a checkout session for upgrading `user_id` to `plan`.
    ///
    /// Fails with `UnknownPlan` before any network call if the plan has no
    /// mapped price.
    async fn create_checkout_session(
        &self,
        user_id: &UserId,
        email: &str,
        plan: Plan,
    ) -> Result<CheckoutSession, BillingError>;
}
