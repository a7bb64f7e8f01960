//! Store traits
//!
//! Define async store interfaces for the entitlement store, the usage
//! ledger, and the user roster.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use quill_types::{
    Submission, SubmissionId, SubmissionInput, Subscription, SubscriptionStatus, UsageCounts, User,
    UserId,
};

use crate::error::StoreResult;

/// Entitlement store: one subscription record per user.
///
/// `get` is a raw read; lazy materialization of the default record is the
/// entitlement service's job, not the store's. `set_status` requires an
/// existing record — it must not create one.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Fetch the stored subscription, if any
    async fn get(&self, user_id: &UserId) -> StoreResult<Option<Subscription>>;

    /// Unconditional overwrite. Writing the same record twice is a no-op,
    /// which is what makes webhook replays safe.
    async fn put(&self, user_id: &UserId, sub: Subscription) -> StoreResult<Subscription>;

    /// Atomically set the status of an existing record, leaving plan and
    /// period untouched. Fails with `NotFound` if no record exists.
    async fn set_status(
        &self,
        user_id: &UserId,
        status: SubscriptionStatus,
    ) -> StoreResult<Subscription>;
}

/// Input for appending a ledger record
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: UserId,
    pub input: SubmissionInput,
    pub result: String,
}

/// Usage ledger: append-only submission log with hard delete.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Append a record, generating its id and creation timestamp
    async fn append(&self, new: NewSubmission) -> StoreResult<Submission>;

    /// All submissions for a user, newest first
    async fn list_for_user(&self, user_id: &UserId) -> StoreResult<Vec<Submission>>;

    /// All submissions across users, newest first (admin use)
    async fn list_all(&self) -> StoreResult<Vec<Submission>>;

    /// Hard delete. Idempotent: deleting an absent record is not an error.
    async fn delete(&self, id: &SubmissionId) -> StoreResult<()>;

    /// Per-kind tally for a user, recomputed by scanning
    async fn usage_counts(&self, user_id: &UserId) -> StoreResult<UsageCounts>;

    /// Number of submissions a user created at or after `since`. Drives the
    /// quota gate.
    async fn count_since(&self, user_id: &UserId, since: DateTime<Utc>) -> StoreResult<u64>;
}

/// User roster. Read-only; auth is mocked and accounts are created elsewhere.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by ID
    async fn get(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// All known users (admin use)
    async fn list(&self) -> StoreResult<Vec<User>>;
}
