//! Subscription types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::Plan;

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active
    Active,
    /// Subscription was canceled; plan privileges persist until period end
    Canceled,
    /// Payment is past due. Representable but not yet produced by any
    /// transition; reserved for payment-failure handling.
    PastDue,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Canceled => write!(f, "canceled"),
            Self::PastDue => write!(f, "past_due"),
        }
    }
}

/// A user's subscription. Exactly one per user; materialized lazily with
/// [`Subscription::default_hobby`] on first read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Current plan
    pub plan: Plan,
    /// Subscription status
    pub status: SubscriptionStatus,
    /// End of the current billing period
    pub current_period_end: DateTime<Utc>,
}

impl Subscription {
    /// The default record every user starts on: free hobby plan with a
    /// one-year period.
    pub fn default_hobby(now: DateTime<Utc>) -> Self {
        Self {
            plan: Plan::Hobby,
            status: SubscriptionStatus::Active,
            current_period_end: now + Duration::days(365),
        }
    }

    /// The record a completed paid checkout produces: the purchased plan,
    /// active, with a 30-day billing period.
    pub fn upgraded(plan: Plan, now: DateTime<Utc>) -> Self {
        Self {
            plan,
            status: SubscriptionStatus::Active,
            current_period_end: now + Duration::days(30),
        }
    }

    /// Whether the billing period has ended
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.current_period_end
    }

    /// A canceled subscription keeps its plan until the period ends; after
    /// that it no longer grants anything.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Canceled && self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hobby_is_active_for_a_year() {
        let now = Utc::now();
        let sub = Subscription::default_hobby(now);
        assert_eq!(sub.plan, Plan::Hobby);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.current_period_end, now + Duration::days(365));
        assert!(!sub.is_expired(now));
    }

    #[test]
    fn canceled_keeps_plan_until_period_end() {
        let now = Utc::now();
        let mut sub = Subscription::upgraded(Plan::Pro, now);
        sub.status = SubscriptionStatus::Canceled;

        assert!(!sub.is_lapsed(now));
        assert!(sub.is_lapsed(now + Duration::days(31)));
    }
}
