use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    models::WebhookRequest,
    services::{
        rating_store::RatingStore,
        session::{SessionStore, DEFAULT_SESSION},
    },
};

pub mod cold_start;
pub mod extract;
pub mod recommendations;
pub mod webhook;

/// Shared application state
pub struct AppState {
    /// Catalog and filtered ratings, read-only after startup
    pub store: Arc<RatingStore>,
    /// Cold-start sets offered per conversation
    pub sessions: SessionStore,
    pub config: Config,
}

impl AppState {
    pub fn new(store: RatingStore, config: Config) -> Self {
        let sessions = SessionStore::new(config.session_capacity, config.session_idle());
        Self {
            store: Arc::new(store),
            sessions,
            config,
        }
    }
}

/// Session key for a request, shared default when the platform sends none
pub(crate) fn session_key(request: &WebhookRequest) -> &str {
    request.session().unwrap_or(DEFAULT_SESSION)
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/health", get(health_check))
        .route("/webhook", post(webhook::echo_tag))
        .route("/dispatch", post(webhook::dispatch))
        .route("/top5", get(cold_start::top5).post(cold_start::top5))
        .route("/cf", post(recommendations::collaborative_filtering))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// Liveness text
async fn hello() -> &'static str {
    "Hello World!"
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
