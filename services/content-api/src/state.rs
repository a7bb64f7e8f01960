//! Application state for the Content API service.

use std::sync::Arc;

use quill_billing_core::BillingService;
use quill_gen_core::GenerationService;
use quill_store::{SubmissionStore, UserStore};

use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Billing service (entitlements, checkout, webhooks)
    pub billing: Arc<BillingService>,
    /// Generation pipeline
    pub generation: Arc<GenerationService>,
    /// Usage ledger (for the history/usage read surfaces)
    pub submissions: Arc<dyn SubmissionStore>,
    /// Mock user roster
    pub users: Arc<dyn UserStore>,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        billing: Arc<BillingService>,
        generation: Arc<GenerationService>,
        submissions: Arc<dyn SubmissionStore>,
        users: Arc<dyn UserStore>,
        config: Config,
    ) -> Self {
        Self {
            billing,
            generation,
            submissions,
            users,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
