//! Stripe webhook handling
//!
//! Verification and parsing are fail-closed: nothing is parsed, and no state
//! is touched, until the signature checks out. The business mapping from a
//! verified event to a store mutation is the pure [`mutation_for_event`],
//! kept free of transport concerns so it can be tested directly.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use tracing::{debug, error, warn};

use quill_types::{Plan, Subscription, UserId};

use crate::error::BillingError;

/// Maximum allowed skew between the signature timestamp and now
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Webhook event types we recognize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// Checkout session completed - the only event that mutates entitlements
    CheckoutSessionCompleted,
    /// Anything else - acknowledged without action
    Unknown(String),
}

impl From<&str> for WebhookEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: WebhookEventType,
    /// Event data
    pub data: WebhookEventData,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

/// Webhook event data
#[derive(Debug, Clone)]
pub enum WebhookEventData {
    /// Checkout session data
    CheckoutSession(CheckoutSessionData),
    /// Raw JSON for unknown events
    Raw(serde_json::Value),
}

/// Checkout session completed data
#[derive(Debug, Clone)]
pub struct CheckoutSessionData {
    /// Session ID
    pub session_id: String,
    /// Our user ID, round-tripped through `client_reference_id`
    pub client_reference_id: Option<String>,
    /// Purchased plan name, round-tripped through session metadata
    pub plan: Option<String>,
}

/// The store write a verified event implies
#[derive(Debug, Clone, PartialEq)]
pub struct EntitlementMutation {
    /// User whose subscription changes
    pub user_id: UserId,
    /// The record to overwrite with
    pub subscription: Subscription,
}

/// Pure mapping from a verified event to the entitlement mutation it implies.
///
/// Events that carry no actionable data return `None`; the transport layer
/// still acknowledges them so the processor stops retrying.
pub fn mutation_for_event(event: &WebhookEvent, now: DateTime<Utc>) -> Option<EntitlementMutation> {
    match (&event.event_type, &event.data) {
        (WebhookEventType::CheckoutSessionCompleted, WebhookEventData::CheckoutSession(data)) => {
            let Some(user_id) = data.client_reference_id.as_deref().filter(|s| !s.is_empty())
            else {
                warn!(event_id = %event.id, "Checkout completed without client_reference_id");
                return None;
            };
            let plan = match data.plan.as_deref().map(str::parse::<Plan>) {
                Some(Ok(plan)) => plan,
                _ => {
                    warn!(event_id = %event.id, plan = ?data.plan, "Checkout completed without a recognizable plan");
                    return None;
                }
            };
            Some(EntitlementMutation {
                user_id: UserId::from(user_id),
                subscription: Subscription::upgraded(plan, now),
            })
        }
        (WebhookEventType::Unknown(event_type), _) => {
            debug!(event_id = %event.id, event_type = %event_type, "Ignoring unhandled webhook event type");
            None
        }
        _ => None,
    }
}

/// Webhook handler for verifying and parsing Stripe events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a webhook payload
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, BillingError> {
        self.verify_signature(payload, signature)?;

        let raw_event: RawStripeEvent = serde_json::from_slice(payload)
            .map_err(|e| BillingError::WebhookError(e.to_string()))?;

        debug!(event_id = %raw_event.id, event_type = %raw_event.event_type, "Parsed webhook event");

        let event_type = WebhookEventType::from(raw_event.event_type.as_str());
        let data = match event_type {
            WebhookEventType::CheckoutSessionCompleted => {
                let session: RawCheckoutSession = serde_json::from_value(raw_event.data.object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                WebhookEventData::CheckoutSession(CheckoutSessionData {
                    session_id: session.id,
                    client_reference_id: session.client_reference_id,
                    plan: session.metadata.and_then(|m| m.plan),
                })
            }
            WebhookEventType::Unknown(_) => WebhookEventData::Raw(raw_event.data.object),
        };

        Ok(WebhookEvent {
            id: raw_event.id,
            event_type,
            data,
            created: raw_event.created,
        })
    }

    /// Verify the Stripe webhook signature
    fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<(), BillingError> {
        // Parse signature header: t=timestamp,v1=signature
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            BillingError::WebhookError("Missing timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature");
            BillingError::WebhookError("Missing signature".to_string())
        })?;

        let signed_payload = format!(
            "{}.{}",
            timestamp,
            std::str::from_utf8(payload)
                .map_err(|_| BillingError::WebhookError("Invalid payload encoding".to_string()))?
        );

        let mut mac = Hmac::<sha2::Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| BillingError::Internal("HMAC error".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            error!("Webhook signature verification failed");
            return Err(BillingError::WebhookError(
                "Signature verification failed".to_string(),
            ));
        }

        // Reject replays outside the freshness window
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| BillingError::WebhookError("Invalid timestamp format".to_string()))?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
            warn!(timestamp = ts, now = now, "Webhook timestamp too old");
            return Err(BillingError::WebhookError("Timestamp too old".to_string()));
        }

        Ok(())
    }
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Raw Stripe event shapes for parsing

#[derive(Debug, Deserialize)]
struct RawStripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    id: String,
    client_reference_id: Option<String>,
    metadata: Option<RawSessionMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawSessionMetadata {
    plan: Option<String>,
}
