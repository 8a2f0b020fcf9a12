use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::conversation::orchestrator::TurnError;
use crate::feedback::FeedbackError;
use crate::inference_client::InferenceError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The user's message was stored before the backend failed.
    #[error("Inference error: {source}")]
    Inference {
        user_message_id: i64,
        source: InferenceError,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<TurnError> for AppError {
    fn from(err: TurnError) -> Self {
        match err {
            TurnError::Persistence(e) => AppError::Persistence(e),
            TurnError::Inference {
                user_message,
                source,
                ..
            } => AppError::Inference {
                user_message_id: user_message.id,
                source,
            },
        }
    }
}

impl From<FeedbackError> for AppError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::InvalidRating(_) => AppError::Validation(err.to_string()),
            FeedbackError::Store(e) => AppError::Persistence(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Persistence(e) => {
                tracing::error!("Persistence error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Inference {
                user_message_id,
                source,
            } => {
                tracing::error!("Inference error after message {user_message_id}: {source}");
                let (status, code) = match source {
                    InferenceError::Timeout { .. } => {
                        (StatusCode::GATEWAY_TIMEOUT, "INFERENCE_TIMEOUT")
                    }
                    InferenceError::Http { .. } => (StatusCode::BAD_GATEWAY, "INFERENCE_HTTP_ERROR"),
                    InferenceError::Transport(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "INFERENCE_UNAVAILABLE")
                    }
                    InferenceError::MalformedResponse(_) => {
                        (StatusCode::BAD_GATEWAY, "INFERENCE_MALFORMED_RESPONSE")
                    }
                };
                let body = Json(json!({
                    "error": {
                        "code": code,
                        "message": source.to_string(),
                        "user_message_id": user_message_id
                    }
                }));
                return (status, body).into_response();
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
