use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{WebhookRequest, WebhookResponse},
    routes::{cold_start::offer_cold_start, extract::WebhookJson, session_key, AppState},
    services::recommendations::{recommend_for_new_user_blocking, Recommendation},
};

/// Intent parameter holding the comma separated cold-start ratings
pub const USER_RATINGS_PARAM: &str = "user_ratings";

/// Recommends books from the ratings a user gave the cold-start set.
///
/// A session that was never offered a set gets one first, so the ratings
/// are matched against the current most popular books.
pub async fn recommend_from_ratings(
    state: &AppState,
    request: &WebhookRequest,
) -> AppResult<Recommendation> {
    let session = session_key(request);
    let set = match state.sessions.get(session).await {
        Some(set) => set,
        None => offer_cold_start(state, session).await?,
    };

    let raw_ratings = request.original_value(USER_RATINGS_PARAM).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "missing intentInfo.parameters.{}.originalValue",
            USER_RATINGS_PARAM
        ))
    })?;

    recommend_for_new_user_blocking(
        state.store.clone(),
        set,
        raw_ratings,
        state.config.top_n,
        state.config.svd_params(),
    )
    .await
}

/// Handler for the collaborative filtering endpoint
pub async fn collaborative_filtering(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    WebhookJson(request): WebhookJson<WebhookRequest>,
) -> AppResult<Json<WebhookResponse>> {
    tracing::info!(
        request_id = %request_id,
        session = session_key(&request),
        "Processing recommendation request"
    );

    let recommendation = recommend_from_ratings(&state, &request).await?;

    tracing::info!(
        request_id = %request_id,
        user_id = recommendation.user_id,
        recommended = recommendation.books.len(),
        "Recommendation completed"
    );

    Ok(Json(WebhookResponse::text(recommendation.text)))
}
