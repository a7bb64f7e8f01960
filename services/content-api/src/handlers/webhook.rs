//! Stripe webhook handler

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use std::time::Instant;

use quill_billing_core::BillingError;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /api/stripe-webhook
///
/// Handle Stripe webhook events with signature verification. Bad signatures
/// are a client error; store failures are a server error so Stripe redelivers.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, StatusCode> {
    let start = Instant::now();

    let Some(sig_header) = headers.get("stripe-signature") else {
        tracing::warn!("Missing Stripe-Signature header");
        return Err(StatusCode::BAD_REQUEST);
    };

    let Ok(signature) = sig_header.to_str() else {
        tracing::warn!("Invalid Stripe-Signature header encoding");
        return Err(StatusCode::BAD_REQUEST);
    };

    match state.billing.process_webhook(&body, signature).await {
        Ok(()) => {
            metrics::counter!("quill_webhooks_processed_total", "status" => "success")
                .increment(1);
            metrics::histogram!(
                "quill_operation_duration_seconds",
                "operation" => "process_webhook",
                "result" => "ok"
            )
            .record(start.elapsed().as_secs_f64());

            Ok(Json(WebhookAck { received: true }))
        }
        Err(e) => {
            tracing::error!(error = ?e, "Webhook processing failed");
            metrics::counter!("quill_webhooks_processed_total", "status" => "error").increment(1);

            // Verification/parsing problems are the sender's fault; anything
            // else (store failure) must surface as 500 so Stripe retries.
            match e {
                BillingError::WebhookError(_) => Err(StatusCode::BAD_REQUEST),
                _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
            }
        }
    }
}
