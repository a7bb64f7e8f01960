//! Checkout session handler

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::instrument;

use quill_types::{Plan, UserId};

use crate::error::{ApiError, ApiResult};
use crate::handlers::record_op_duration;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// POST /api/create-checkout-session
#[instrument(skip(state, req))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(req): Json<CreateCheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let start = Instant::now();

    let (Some(user_id), Some(email), Some(plan)) = (&req.user_id, &req.email, &req.plan) else {
        return Err(ApiError::BadRequest(
            "Missing required parameters: userId, email, plan".to_string(),
        ));
    };

    let plan: Plan = plan
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("unknown plan: {plan}")))?;

    let session = state
        .billing
        .create_checkout(&UserId::from(user_id.as_str()), email, plan)
        .await?;

    metrics::counter!("quill_checkouts_created_total").increment(1);
    record_op_duration("create_checkout", start, true);

    Ok(Json(CheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}
