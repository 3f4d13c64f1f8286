use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{WebhookRequest, WebhookResponse},
    routes::{
        cold_start::offer_cold_start, extract::WebhookJson, recommendations::recommend_from_ratings,
        session_key, AppState,
    },
    services::dispatch::Intent,
};

fn require_tag(request: &WebhookRequest) -> AppResult<&str> {
    request
        .tag()
        .ok_or_else(|| AppError::InvalidInput("missing fulfillmentInfo.tag".to_string()))
}

/// Echoes the fulfillment tag back as the message text
pub async fn echo_tag(
    WebhookJson(request): WebhookJson<WebhookRequest>,
) -> AppResult<Json<WebhookResponse>> {
    let tag = require_tag(&request)?;
    Ok(Json(WebhookResponse::text(tag)))
}

/// Routes a webhook call to the flow named by its fulfillment tag
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    WebhookJson(request): WebhookJson<WebhookRequest>,
) -> AppResult<Json<WebhookResponse>> {
    let intent = Intent::from_tag(require_tag(&request)?)?;

    tracing::info!(request_id = %request_id, intent = %intent, "Dispatching webhook call");

    let text = match intent {
        Intent::ColdStart => offer_cold_start(&state, session_key(&request)).await?.prompt,
        Intent::Recommend => recommend_from_ratings(&state, &request).await?.text,
    };

    Ok(Json(WebhookResponse::text(text)))
}
