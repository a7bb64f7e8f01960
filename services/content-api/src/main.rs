//! Quill Content API
//!
//! Backend service for the quill social-content product.
//!
//! ## REST Endpoints
//!
//! - `POST /api/generate-reply` - Generate a short reply to a post
//! - `POST /api/generate-tweets` - Generate three viral tweet ideas
//! - `POST /api/create-checkout-session` - Create a Stripe checkout session
//! - `POST /api/stripe-webhook` - Stripe webhook handler
//! - `GET  /api/subscription` - Get a user's subscription
//! - `POST /api/subscription/cancel` - Cancel a subscription
//! - `POST /api/subscription/reactivate` - Reactivate a subscription
//! - `GET  /api/submissions` - List a user's generation history
//! - `DELETE /api/submissions/{id}` - Delete a history entry
//! - `GET  /api/usage` - Derived usage counts for a user
//! - `GET  /api/admin/{submissions,usage,users}` - Admin surfaces
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use quill_billing_core::{BillingService, StripeProvider, WebhookHandler};
use quill_gen_core::{GeminiClient, GeminiConfig, GenerationService, SafetyFilter};
use quill_store::{MemorySubmissionStore, MemorySubscriptionStore, MemoryUserStore};
use quill_types::{User, UserId};

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("content_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Quill Content API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(http_port = config.http_port, "Configuration loaded");

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Stores, constructed once and injected everywhere
    let subscriptions = Arc::new(MemorySubscriptionStore::new());
    let submissions = Arc::new(MemorySubmissionStore::new());
    let users = Arc::new(MemoryUserStore::seeded(mock_users()));

    // Billing service
    let provider = Arc::new(StripeProvider::new(config.billing.clone()));
    let webhooks = WebhookHandler::new(config.billing.stripe_webhook_secret.clone());
    let billing = Arc::new(BillingService::new(
        subscriptions.clone(),
        provider,
        webhooks,
    ));

    // Generation pipeline
    let backend = Arc::new(GeminiClient::new(
        GeminiConfig::new(config.gemini_api_key.clone())
            .with_model(config.gemini_model.clone())
            .with_timeout(config.generation_timeout),
    )?);
    let generation = Arc::new(GenerationService::new(
        backend,
        SafetyFilter::new(),
        billing.clone(),
        submissions.clone(),
    ));

    // Application state
    let state = AppState::new(billing, generation, submissions, users, config.clone());

    // Build and run the HTTP server
    let app = build_router(state.clone(), metrics_handle);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    run_http_server(app, addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Mock user roster. Auth is out of scope; these mirror the accounts the
/// frontend's mocked auth layer signs in as.
fn mock_users() -> Vec<User> {
    vec![
        User {
            id: UserId::from("user123"),
            name: "Alex".to_string(),
            email: "alex@example.com".to_string(),
            is_admin: false,
        },
        User {
            id: UserId::from("admin456"),
            name: "Admin Sam".to_string(),
            email: "sam@example.com".to_string(),
            is_admin: true,
        },
        User {
            id: UserId::from("user789"),
            name: "Beth".to_string(),
            email: "beth@example.com".to_string(),
            is_admin: false,
        },
        User {
            id: UserId::from("user101"),
            name: "Charlie".to_string(),
            email: "charlie@example.com".to_string(),
            is_admin: false,
        },
    ]
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // API routes
    let api = Router::new()
        // Generation
        .route("/generate-reply", post(handlers::generate_reply))
        .route("/generate-tweets", post(handlers::generate_tweets))
        // Checkout
        .route(
            "/create-checkout-session",
            post(handlers::create_checkout_session),
        )
        // Subscription lifecycle
        .route("/subscription", get(handlers::get_subscription))
        .route("/subscription/cancel", post(handlers::cancel_subscription))
        .route(
            "/subscription/reactivate",
            post(handlers::reactivate_subscription),
        )
        // History + usage
        .route("/submissions", get(handlers::list_submissions))
        .route("/submissions/{id}", delete(handlers::delete_submission))
        .route("/usage", get(handlers::get_usage))
        // Admin surfaces
        .route("/admin/submissions", get(handlers::admin_list_submissions))
        .route("/admin/usage", get(handlers::admin_usage))
        .route("/admin/users", get(handlers::admin_list_users));

    // Webhook route (separate - uses the raw body for signature verification)
    let webhook_routes = Router::new().route("/api/stripe-webhook", post(handlers::stripe_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api", api)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Generation calls dominate latency; buckets stretch to cover model
    // round-trips.
    let latency_buckets = &[0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

    let builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("quill_operation_duration_seconds".to_string()),
        latency_buckets,
    )?;

    let handle = builder.install_recorder()?;

    metrics::describe_counter!(
        "quill_generations_total",
        "Total generation requests by kind and result"
    );
    metrics::describe_counter!(
        "quill_checkouts_created_total",
        "Total checkout sessions created"
    );
    metrics::describe_counter!(
        "quill_subscriptions_canceled_total",
        "Total subscriptions canceled"
    );
    metrics::describe_counter!(
        "quill_webhooks_processed_total",
        "Total webhooks processed by status"
    );
    metrics::describe_histogram!(
        "quill_operation_duration_seconds",
        "Operation latency in seconds by operation and result"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
