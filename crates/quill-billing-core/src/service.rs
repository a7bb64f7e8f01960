//! Entitlement service
//!
//! The subscription state machine on top of the entitlement store:
//!
//! ```text
//! [no record] --first get--> hobby/active (period +365d)
//! active --cancel--> canceled
//! canceled --reactivate--> active
//! active/canceled --checkout.session.completed--> {plan, active, +30d}
//! canceled & expired --next get--> hobby/active (period +365d)
//! ```
//!
//! No transition ever removes a record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use quill_store::{StoreError, SubscriptionStore};
use quill_types::{Plan, Subscription, SubscriptionStatus, UserId};

use crate::error::BillingError;
use crate::provider::{CheckoutSession, PaymentProvider};
use crate::webhook::{mutation_for_event, WebhookHandler};

/// Billing service: entitlement lifecycle, checkout, webhook ingestion
pub struct BillingService {
    subscriptions: Arc<dyn SubscriptionStore>,
    provider: Arc<dyn PaymentProvider>,
    webhooks: WebhookHandler,
}

impl BillingService {
    /// Create a new billing service
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        provider: Arc<dyn PaymentProvider>,
        webhooks: WebhookHandler,
    ) -> Self {
        Self {
            subscriptions,
            provider,
            webhooks,
        }
    }

    /// Get a user's subscription. Never fails for a valid user: a missing
    /// record is materialized as the hobby default, and a canceled record
    /// whose period has ended is downgraded to the hobby default before
    /// being returned.
    #[instrument(skip(self))]
    pub async fn get_subscription(&self, user_id: &UserId) -> Result<Subscription, BillingError> {
        let now = Utc::now();

        match self.subscriptions.get(user_id).await? {
            Some(sub) if sub.is_lapsed(now) => {
                info!(user_id = %user_id, plan = %sub.plan, "Canceled subscription lapsed, downgrading to hobby");
                let downgraded = Subscription::default_hobby(now);
                Ok(self.subscriptions.put(user_id, downgraded).await?)
            }
            Some(sub) => Ok(sub),
            None => {
                let default = Subscription::default_hobby(now);
                Ok(self.subscriptions.put(user_id, default).await?)
            }
        }
    }

    /// Cancel a subscription. Status-only transition; plan and period are
    /// untouched so privileges persist until the period ends.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: &UserId) -> Result<Subscription, BillingError> {
        let sub = self
            .subscriptions
            .set_status(user_id, SubscriptionStatus::Canceled)
            .await
            .map_err(not_found_as_missing_subscription)?;
        info!(user_id = %user_id, plan = %sub.plan, "Subscription canceled");
        Ok(sub)
    }

    /// Reactivate a canceled subscription. Status-only transition.
    #[instrument(skip(self))]
    pub async fn reactivate(&self, user_id: &UserId) -> Result<Subscription, BillingError> {
        let sub = self
            .subscriptions
            .set_status(user_id, SubscriptionStatus::Active)
            .await
            .map_err(not_found_as_missing_subscription)?;
        info!(user_id = %user_id, plan = %sub.plan, "Subscription reactivated");
        Ok(sub)
    }

    /// Create a checkout session for upgrading to a paid plan.
    #[instrument(skip(self, email))]
    pub async fn create_checkout(
        &self,
        user_id: &UserId,
        email: &str,
        plan: Plan,
    ) -> Result<CheckoutSession, BillingError> {
        if user_id.as_str().is_empty() {
            return Err(BillingError::MissingField("userId"));
        }
        if email.is_empty() {
            return Err(BillingError::MissingField("email"));
        }

        let session = self
            .provider
            .create_checkout_session(user_id, email, plan)
            .await?;

        info!(user_id = %user_id, plan = %plan, session_id = %session.session_id, "Checkout session created");
        Ok(session)
    }

    /// Verify and apply a webhook delivery.
    ///
    /// Safe under at-least-once delivery: the upgrade is an absolute
    /// overwrite, so replays converge on the same stored state. Store
    /// failures propagate so the processor retries; events that carry no
    /// actionable data are acknowledged without mutation.
    #[instrument(skip(self, payload, signature))]
    pub async fn process_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<(), BillingError> {
        let event = self.webhooks.verify_and_parse(payload, signature)?;

        match mutation_for_event(&event, Utc::now()) {
            Some(mutation) => {
                info!(
                    event_id = %event.id,
                    user_id = %mutation.user_id,
                    plan = %mutation.subscription.plan,
                    "Applying entitlement upgrade from webhook"
                );
                self.subscriptions
                    .put(&mutation.user_id, mutation.subscription)
                    .await?;
                Ok(())
            }
            None => {
                // Acknowledged without action; retrying would not help.
                Ok(())
            }
        }
    }
}

fn not_found_as_missing_subscription(err: StoreError) -> BillingError {
    match err {
        StoreError::NotFound => {
            warn!("Status transition requested for user with no subscription record");
            BillingError::SubscriptionNotFound
        }
        other => BillingError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use hmac::{Hmac, Mac};
    use quill_store::MemorySubscriptionStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider stub that counts calls and returns a fixed session
    #[derive(Default)]
    struct StubProvider {
        calls: AtomicUsize,
        known_plans: Vec<Plan>,
    }

    impl StubProvider {
        fn priced(plans: &[Plan]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                known_plans: plans.to_vec(),
            }
        }
    }

    #[async_trait]
    impl PaymentProvider for StubProvider {
        async fn create_checkout_session(
            &self,
            _user_id: &UserId,
            _email: &str,
            plan: Plan,
        ) -> Result<CheckoutSession, BillingError> {
            if !self.known_plans.contains(&plan) {
                return Err(BillingError::UnknownPlan(plan.to_string()));
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CheckoutSession {
                session_id: "cs_test_123".to_string(),
                url: Some("https://checkout.stripe.com/cs_test_123".to_string()),
            })
        }
    }

    fn service_with(
        store: MemorySubscriptionStore,
        provider: Arc<StubProvider>,
    ) -> BillingService {
        BillingService::new(Arc::new(store), provider, WebhookHandler::new("whsec_test"))
    }

    fn service(store: MemorySubscriptionStore) -> BillingService {
        service_with(store, Arc::new(StubProvider::priced(&[Plan::Pro, Plan::Team])))
    }

    fn sign(payload: &[u8], secret: &str) -> String {
        let ts = Utc::now().timestamp();
        let signed_payload = format!("{}.{}", ts, std::str::from_utf8(payload).unwrap());
        let mut mac = Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed_payload.as_bytes());
        format!("t={},v1={}", ts, hex::encode(mac.finalize().into_bytes()))
    }

    fn checkout_completed_payload(user_id: &str, plan: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_test_123",
            "type": "checkout.session.completed",
            "created": Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "client_reference_id": user_id,
                    "metadata": { "plan": plan }
                }
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn first_get_materializes_hobby_default() {
        let store = MemorySubscriptionStore::new();
        let billing = service(store.clone());
        let user = UserId::from("u1");

        let sub = billing.get_subscription(&user).await.unwrap();
        assert_eq!(sub.plan, Plan::Hobby);
        assert_eq!(sub.status, SubscriptionStatus::Active);

        // Persisted, and idempotent on repeated reads
        let stored = store.get(&user).await.unwrap().unwrap();
        let again = billing.get_subscription(&user).await.unwrap();
        assert_eq!(stored, again);
    }

    #[tokio::test]
    async fn cancel_then_reactivate_round_trips() {
        let store = MemorySubscriptionStore::new();
        let billing = service(store.clone());
        let user = UserId::from("u1");

        let original = store
            .put(&user, Subscription::upgraded(Plan::Pro, Utc::now()))
            .await
            .unwrap();

        let canceled = billing.cancel(&user).await.unwrap();
        assert_eq!(canceled.status, SubscriptionStatus::Canceled);
        assert_eq!(canceled.plan, Plan::Pro);

        let reactivated = billing.reactivate(&user).await.unwrap();
        assert_eq!(reactivated.status, SubscriptionStatus::Active);
        assert_eq!(reactivated.plan, original.plan);
        assert_eq!(reactivated.current_period_end, original.current_period_end);
    }

    #[tokio::test]
    async fn cancel_without_record_is_not_found() {
        let billing = service(MemorySubscriptionStore::new());
        let err = billing.cancel(&UserId::from("ghost")).await.unwrap_err();
        assert!(matches!(err, BillingError::SubscriptionNotFound));

        let err = billing.reactivate(&UserId::from("ghost")).await.unwrap_err();
        assert!(matches!(err, BillingError::SubscriptionNotFound));
    }

    #[tokio::test]
    async fn lapsed_cancellation_downgrades_on_read() {
        let store = MemorySubscriptionStore::new();
        let billing = service(store.clone());
        let user = UserId::from("u1");

        let expired = Subscription {
            plan: Plan::Pro,
            status: SubscriptionStatus::Canceled,
            current_period_end: Utc::now() - Duration::days(1),
        };
        store.put(&user, expired).await.unwrap();

        let sub = billing.get_subscription(&user).await.unwrap();
        assert_eq!(sub.plan, Plan::Hobby);
        assert_eq!(sub.status, SubscriptionStatus::Active);

        // The downgrade is persisted, not just returned
        assert_eq!(store.get(&user).await.unwrap().unwrap().plan, Plan::Hobby);
    }

    #[tokio::test]
    async fn canceled_but_unexpired_keeps_plan() {
        let store = MemorySubscriptionStore::new();
        let billing = service(store.clone());
        let user = UserId::from("u1");

        store
            .put(
                &user,
                Subscription {
                    plan: Plan::Pro,
                    status: SubscriptionStatus::Canceled,
                    current_period_end: Utc::now() + Duration::days(10),
                },
            )
            .await
            .unwrap();

        let sub = billing.get_subscription(&user).await.unwrap();
        assert_eq!(sub.plan, Plan::Pro);
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
    }

    #[tokio::test]
    async fn checkout_rejects_unknown_plan_without_provider_call() {
        let provider = Arc::new(StubProvider::priced(&[Plan::Pro]));
        let billing = service_with(MemorySubscriptionStore::new(), provider.clone());

        let err = billing
            .create_checkout(&UserId::from("u1"), "alex@example.com", Plan::Team)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::UnknownPlan(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn checkout_rejects_missing_fields() {
        let provider = Arc::new(StubProvider::priced(&[Plan::Pro]));
        let billing = service_with(MemorySubscriptionStore::new(), provider.clone());

        let err = billing
            .create_checkout(&UserId::from(""), "alex@example.com", Plan::Pro)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::MissingField("userId")));

        let err = billing
            .create_checkout(&UserId::from("u1"), "", Plan::Pro)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::MissingField("email")));

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn webhook_upgrade_applies_and_is_idempotent() {
        let store = MemorySubscriptionStore::new();
        let billing = service(store.clone());
        let user = UserId::from("u1");

        let payload = checkout_completed_payload("u1", "pro");
        let sig = sign(&payload, "whsec_test");

        billing.process_webhook(&payload, &sig).await.unwrap();
        let first = store.get(&user).await.unwrap().unwrap();
        assert_eq!(first.plan, Plan::Pro);
        assert_eq!(first.status, SubscriptionStatus::Active);

        // At-least-once delivery: the same event applied again converges
        billing.process_webhook(&payload, &sig).await.unwrap();
        let second = store.get(&user).await.unwrap().unwrap();
        assert_eq!(second.plan, first.plan);
        assert_eq!(second.status, first.status);
    }

    #[tokio::test]
    async fn webhook_bad_signature_leaves_store_untouched() {
        let store = MemorySubscriptionStore::new();
        let billing = service(store.clone());

        let payload = checkout_completed_payload("u1", "pro");
        let sig = sign(&payload, "whsec_wrong");

        let err = billing.process_webhook(&payload, &sig).await.unwrap_err();
        assert!(matches!(err, BillingError::WebhookError(_)));
        assert!(store.get(&UserId::from("u1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn webhook_unknown_event_acknowledged_without_mutation() {
        let store = MemorySubscriptionStore::new();
        let billing = service(store.clone());

        let payload = serde_json::to_vec(&json!({
            "id": "evt_test_456",
            "type": "invoice.paid",
            "created": Utc::now().timestamp(),
            "data": { "object": { "id": "in_test_1" } }
        }))
        .unwrap();
        let sig = sign(&payload, "whsec_test");

        billing.process_webhook(&payload, &sig).await.unwrap();
        assert!(store.get(&UserId::from("u1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn webhook_missing_metadata_acknowledged_without_mutation() {
        let store = MemorySubscriptionStore::new();
        let billing = service(store.clone());

        let payload = serde_json::to_vec(&json!({
            "id": "evt_test_789",
            "type": "checkout.session.completed",
            "created": Utc::now().timestamp(),
            "data": { "object": { "id": "cs_test_1", "client_reference_id": null, "metadata": { "plan": "pro" } } }
        }))
        .unwrap();
        let sig = sign(&payload, "whsec_test");

        billing.process_webhook(&payload, &sig).await.unwrap();
        assert!(store.get(&UserId::from("u1")).await.unwrap().is_none());
    }
}
