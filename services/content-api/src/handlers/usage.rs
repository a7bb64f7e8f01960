//! Usage tracking handlers
//!
//! Usage counts are derived by scanning the ledger on every request rather
//! than cached; staleness is not acceptable across a submission's creation
//! or deletion.

use std::collections::HashMap;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::instrument;

use quill_types::{UsageCounts, UserId};

use crate::error::{ApiError, ApiResult};
use crate::handlers::record_op_duration;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageQuery {
    pub user_id: String,
}

/// GET /api/usage?userId=...
#[instrument(skip(state))]
pub async fn get_usage(
    State(state): State<AppState>,
    Query(query): Query<UsageQuery>,
) -> ApiResult<Json<UsageCounts>> {
    let start = Instant::now();

    let counts = state
        .submissions
        .usage_counts(&UserId::from(query.user_id.as_str()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    record_op_duration("get_usage", start, true);
    Ok(Json(counts))
}

/// GET /api/admin/usage
///
/// Per-user usage counts across the whole ledger.
#[instrument(skip(state))]
pub async fn admin_usage(
    State(state): State<AppState>,
) -> ApiResult<Json<HashMap<String, UsageCounts>>> {
    let start = Instant::now();

    let rows = state
        .submissions
        .list_all()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut counts: HashMap<String, UsageCounts> = HashMap::new();
    for row in rows {
        counts
            .entry(row.user_id.to_string())
            .or_default()
            .record(row.kind);
    }

    record_op_duration("admin_usage", start, true);
    Ok(Json(counts))
}
