//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Subscription not found (cancel/reactivate on a user with no record)
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// Checkout requested for a plan with no mapped price
    #[error("unknown or unpriceable plan: {0}")]
    UnknownPlan(String),

    /// Required checkout field missing or empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Payment provider error
    #[error("provider error: {0}")]
    ProviderError(String),

    /// Webhook verification or parsing error
    #[error("webhook error: {0}")]
    WebhookError(String),

    /// Storage error
    #[error(transparent)]
    Store(#[from] quill_store::StoreError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Whether the caller supplied bad input (as opposed to us or an
    /// upstream failing)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::SubscriptionNotFound
                | Self::UnknownPlan(_)
                | Self::MissingField(_)
                | Self::WebhookError(_)
        )
    }
}
