//! Error types for the Content API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use quill_billing_core::BillingError;
use quill_gen_core::GenerateError;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Input contains potentially unsafe content")]
    UnsafeInput,

    #[error("Generation quota exhausted: {used} of {limit} used this month")]
    QuotaExceeded { used: u64, limit: u64 },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Webhook error: {0}")]
    WebhookError(String),

    #[error("Generated content was deemed unsafe")]
    UnsafeOutput,

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::UnsafeInput | Self::WebhookError(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::QuotaExceeded { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsafeOutput | Self::GenerationFailed(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::UnsafeInput => "UNSAFE_INPUT",
            Self::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::WebhookError(_) => "WEBHOOK_ERROR",
            Self::UnsafeOutput => "UNSAFE_OUTPUT",
            Self::GenerationFailed(_) => "GENERATION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::InvalidRequest(field) => {
                Self::BadRequest(format!("missing or invalid field: {field}"))
            }
            GenerateError::UnsafeInput => Self::UnsafeInput,
            GenerateError::UnsafeOutput => Self::UnsafeOutput,
            GenerateError::QuotaExceeded { used, limit } => Self::QuotaExceeded { used, limit },
            GenerateError::Backend(msg) | GenerateError::MalformedResponse(msg) => {
                Self::GenerationFailed(msg)
            }
            GenerateError::Store(e) => Self::Internal(e.to_string()),
            GenerateError::Billing(e) => Self::from(e),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::SubscriptionNotFound => Self::NotFound("subscription"),
            BillingError::UnknownPlan(plan) => Self::BadRequest(format!("unknown plan: {plan}")),
            BillingError::MissingField(field) => {
                Self::BadRequest(format!("missing required field: {field}"))
            }
            BillingError::WebhookError(msg) => Self::WebhookError(msg),
            BillingError::ProviderError(msg) => Self::Internal(msg),
            BillingError::Store(e) => Self::Internal(e.to_string()),
            BillingError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Full detail stays server-side; the body carries a generic message.
        match &self {
            Self::Internal(_) | Self::GenerationFailed(_) | Self::UnsafeOutput => {
                tracing::error!(error = ?self, "Internal API error");
            }
            _ => {
                tracing::debug!(error = ?self, "Client error");
            }
        }

        let message = match &self {
            Self::Internal(_) => "An unexpected error occurred.".to_string(),
            Self::GenerationFailed(_) => {
                "Failed to generate content. Please try again later.".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
