//! Generation handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::instrument;

use quill_types::UserId;

use crate::error::ApiResult;
use crate::handlers::record_op_duration;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReplyRequest {
    #[serde(default)]
    pub post_content: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    /// Identified callers get their generation recorded and metered;
    /// anonymous generation is allowed but unrecorded.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateReplyResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTweetsRequest {
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateTweetsResponse {
    pub tweets: Vec<String>,
}

fn identified_user(raw: &Option<String>) -> Option<UserId> {
    raw.as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(UserId::from)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/generate-reply
#[instrument(skip(state, req))]
pub async fn generate_reply(
    State(state): State<AppState>,
    Json(req): Json<GenerateReplyRequest>,
) -> ApiResult<Json<GenerateReplyResponse>> {
    let start = Instant::now();
    let user = identified_user(&req.user_id);

    let result = state
        .generation
        .generate_short_reply(
            user.as_ref(),
            req.post_content.as_deref().unwrap_or(""),
            req.tone.as_deref().unwrap_or(""),
        )
        .await;

    let success = result.is_ok();
    metrics::counter!(
        "quill_generations_total",
        "kind" => "short-reply",
        "result" => if success { "ok" } else { "err" }
    )
    .increment(1);
    record_op_duration("generate_reply", start, success);

    Ok(Json(GenerateReplyResponse { reply: result? }))
}

/// POST /api/generate-tweets
#[instrument(skip(state, req))]
pub async fn generate_tweets(
    State(state): State<AppState>,
    Json(req): Json<GenerateTweetsRequest>,
) -> ApiResult<Json<GenerateTweetsResponse>> {
    let start = Instant::now();
    let user = identified_user(&req.user_id);

    let result = state
        .generation
        .generate_viral_tweets(user.as_ref(), &req.examples)
        .await;

    let success = result.is_ok();
    metrics::counter!(
        "quill_generations_total",
        "kind" => "viral-tweet",
        "result" => if success { "ok" } else { "err" }
    )
    .increment(1);
    record_op_duration("generate_tweets", start, success);

    Ok(Json(GenerateTweetsResponse { tweets: result? }))
}
