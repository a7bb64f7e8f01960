//! Generation pipeline errors

use thiserror::Error;

/// Generation pipeline errors
#[derive(Error, Debug)]
pub enum GenerateError {
    /// Required field missing or malformed. Detected before any external
    /// call; no side effects.
    #[error("missing or invalid field: {0}")]
    InvalidRequest(&'static str),

    /// Input flagged by the safety filter; no model call is made
    #[error("input contains potentially unsafe content")]
    UnsafeInput,

    /// Model output flagged by the safety filter. The caller did nothing
    /// wrong; reported as a server-side failure and logged for audit.
    #[error("generated content was deemed unsafe")]
    UnsafeOutput,

    /// Monthly generation quota exhausted for the user's plan
    #[error("generation quota exhausted: {used} of {limit} used this month")]
    QuotaExceeded {
        /// Generations already used this period
        used: u64,
        /// Plan limit for the period
        limit: u64,
    },

    /// Backend call failed (transport, upstream error, empty response).
    /// Retryable by the user; never retried internally.
    #[error("generation backend error: {0}")]
    Backend(String),

    /// Backend responded but the payload violates the output contract
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// Storage error while appending to the usage ledger
    #[error(transparent)]
    Store(#[from] quill_store::StoreError),

    /// Entitlement lookup failure during the quota check
    #[error(transparent)]
    Billing(#[from] quill_billing_core::BillingError),
}

impl GenerateError {
    /// Whether the caller supplied bad input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::UnsafeInput)
    }
}
