//! Submission history handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::instrument;

use quill_types::{Submission, SubmissionId, User, UserId};

use crate::error::{ApiError, ApiResult};
use crate::handlers::record_op_duration;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionsQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub input: serde_json::Value,
    pub result: String,
    pub created_at: String,
}

impl From<Submission> for SubmissionResponse {
    fn from(sub: Submission) -> Self {
        Self {
            id: sub.id.to_string(),
            user_id: sub.user_id.to_string(),
            kind: sub.kind.to_string(),
            input: serde_json::to_value(&sub.input).unwrap_or_default(),
            result: sub.result,
            created_at: sub.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/submissions?userId=...
#[instrument(skip(state))]
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<SubmissionsQuery>,
) -> ApiResult<Json<Vec<SubmissionResponse>>> {
    let start = Instant::now();

    let rows = state
        .submissions
        .list_for_user(&UserId::from(query.user_id.as_str()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    record_op_duration("list_submissions", start, true);
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// DELETE /api/submissions/{id}
///
/// Hard delete, idempotent: deleting an already-absent record also returns
/// 204.
#[instrument(skip(state))]
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let start = Instant::now();

    let id = SubmissionId::parse(&id)
        .map_err(|_| ApiError::BadRequest("invalid submission id".to_string()))?;

    state
        .submissions
        .delete(&id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    record_op_duration("delete_submission", start, true);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/submissions
#[instrument(skip(state))]
pub async fn admin_list_submissions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SubmissionResponse>>> {
    let start = Instant::now();

    let rows = state
        .submissions
        .list_all()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    record_op_duration("admin_list_submissions", start, true);
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/admin/users
#[instrument(skip(state))]
pub async fn admin_list_users(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .users
        .list()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}
