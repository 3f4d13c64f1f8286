use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{WebhookRequest, WebhookResponse},
    routes::{session_key, AppState},
    services::cold_start::{select_cold_start, ColdStartSet},
    services::session::DEFAULT_SESSION,
};

/// Selects the cold-start books and remembers them for the session
pub async fn offer_cold_start(state: &AppState, session: &str) -> AppResult<ColdStartSet> {
    let set = select_cold_start(&state.store, state.config.cold_start_size)?;
    state.sessions.remember(session, set.clone()).await;

    tracing::info!(session, book_ids = ?set.book_ids, "Cold-start books offered");

    Ok(set)
}

/// Handler for the cold-start prompt, GET or POST.
///
/// GET requests carry no payload and use the default session.
pub async fn top5(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    request: Option<Json<WebhookRequest>>,
) -> AppResult<Json<WebhookResponse>> {
    let session = request
        .as_ref()
        .map(|Json(r)| session_key(r))
        .unwrap_or(DEFAULT_SESSION);

    tracing::info!(request_id = %request_id, session, "Processing cold-start request");

    let set = offer_cold_start(&state, session).await?;
    Ok(Json(WebhookResponse::text(set.prompt)))
}
