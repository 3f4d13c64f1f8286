use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::WebhookResponse;
use crate::services::formatter;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Failed to load datasets: {0}")]
    StartupData(String),

    #[error("Catalog has {available} books, need at least {required}")]
    InsufficientCatalog { available: usize, required: usize },

    #[error("Malformed ratings: {0}")]
    MalformedRatingsInput(String),

    #[error("Not enough data to train: {0}")]
    InsufficientData(String),

    #[error("Unrecognized intent: {0}")]
    UnrecognizedIntent(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            // The dialogue platform only renders message bodies of successful
            // webhook calls, so user-facing failures stay 200.
            AppError::InsufficientCatalog { .. }
            | AppError::MalformedRatingsInput(_)
            | AppError::InsufficientData(_)
            | AppError::UnrecognizedIntent(_)
            | AppError::InvalidInput(_) => StatusCode::OK,
            AppError::StartupData(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Request failed");

        let status = self.status();
        let body = Json(WebhookResponse::text(formatter::render_error(&self)));

        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
