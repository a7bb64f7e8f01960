//! In-memory stores
//!
//! `DashMap`-backed implementations of the store traits. Mutations go through
//! per-key entry access, so concurrent writers for the same user serialize on
//! that key instead of racing a read-then-write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use quill_types::{
    Submission, SubmissionId, Subscription, SubscriptionStatus, UsageCounts, User, UserId,
};

use crate::error::{StoreError, StoreResult};
use crate::repo::{NewSubmission, SubmissionStore, SubscriptionStore, UserStore};

/// In-memory entitlement store
#[derive(Default, Clone)]
pub struct MemorySubscriptionStore {
    subs: Arc<DashMap<UserId, Subscription>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn get(&self, user_id: &UserId) -> StoreResult<Option<Subscription>> {
        Ok(self.subs.get(user_id).map(|r| r.value().clone()))
    }

    async fn put(&self, user_id: &UserId, sub: Subscription) -> StoreResult<Subscription> {
        self.subs.insert(user_id.clone(), sub.clone());
        Ok(sub)
    }

    async fn set_status(
        &self,
        user_id: &UserId,
        status: SubscriptionStatus,
    ) -> StoreResult<Subscription> {
        match self.subs.get_mut(user_id) {
            Some(mut entry) => {
                entry.status = status;
                Ok(entry.value().clone())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

/// In-memory usage ledger
#[derive(Default, Clone)]
pub struct MemorySubmissionStore {
    rows: Arc<DashMap<SubmissionId, Submission>>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_desc(mut rows: Vec<Submission>) -> Vec<Submission> {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

#[async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn append(&self, new: NewSubmission) -> StoreResult<Submission> {
        let row = Submission {
            id: SubmissionId::new(),
            user_id: new.user_id,
            kind: new.input.kind(),
            input: new.input,
            result: new.result,
            created_at: Utc::now(),
        };
        self.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: &UserId) -> StoreResult<Vec<Submission>> {
        let rows = self
            .rows
            .iter()
            .filter(|r| &r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        Ok(Self::sorted_desc(rows))
    }

    async fn list_all(&self) -> StoreResult<Vec<Submission>> {
        let rows = self.rows.iter().map(|r| r.value().clone()).collect();
        Ok(Self::sorted_desc(rows))
    }

    async fn delete(&self, id: &SubmissionId) -> StoreResult<()> {
        self.rows.remove(id);
        Ok(())
    }

    async fn usage_counts(&self, user_id: &UserId) -> StoreResult<UsageCounts> {
        let mut counts = UsageCounts::default();
        for row in self.rows.iter() {
            if &row.value().user_id == user_id {
                counts.record(row.value().kind);
            }
        }
        Ok(counts)
    }

    async fn count_since(&self, user_id: &UserId, since: DateTime<Utc>) -> StoreResult<u64> {
        Ok(self
            .rows
            .iter()
            .filter(|r| &r.value().user_id == user_id && r.value().created_at >= since)
            .count() as u64)
    }
}

/// In-memory user roster, seeded at startup
#[derive(Default, Clone)]
pub struct MemoryUserStore {
    users: Arc<DashMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from a fixed set of users
    pub fn seeded(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        for user in users {
            store.users.insert(user.id.clone(), user);
        }
        store
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.users.get(id).map(|r| r.value().clone()))
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();
        users.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(users)
    }
}
