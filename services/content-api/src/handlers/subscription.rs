//! Subscription handlers

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::instrument;

use quill_types::{Subscription, UserId};

use crate::error::{ApiError, ApiResult};
use crate::handlers::record_op_duration;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionMutationRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub plan: String,
    pub status: String,
    pub current_period_end: String,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            plan: sub.plan.to_string(),
            status: sub.status.to_string(),
            current_period_end: sub.current_period_end.to_rfc3339(),
        }
    }
}

fn require_user_id(raw: &Option<String>) -> ApiResult<UserId> {
    raw.as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(UserId::from)
        .ok_or_else(|| ApiError::BadRequest("missing userId".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/subscription?userId=...
#[instrument(skip(state))]
pub async fn get_subscription(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();

    let sub = state
        .billing
        .get_subscription(&UserId::from(query.user_id.as_str()))
        .await?;

    record_op_duration("get_subscription", start, true);
    Ok(Json(sub.into()))
}

/// POST /api/subscription/cancel
#[instrument(skip(state, req))]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Json(req): Json<SubscriptionMutationRequest>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();
    let user_id = require_user_id(&req.user_id)?;

    let sub = state.billing.cancel(&user_id).await?;

    metrics::counter!("quill_subscriptions_canceled_total").increment(1);
    record_op_duration("cancel_subscription", start, true);
    Ok(Json(sub.into()))
}

/// POST /api/subscription/reactivate
#[instrument(skip(state, req))]
pub async fn reactivate_subscription(
    State(state): State<AppState>,
    Json(req): Json<SubscriptionMutationRequest>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();
    let user_id = require_user_id(&req.user_id)?;

    let sub = state.billing.reactivate(&user_id).await?;

    record_op_duration("reactivate_subscription", start, true);
    Ok(Json(sub.into()))
}
