//! Axum route handler for sending a message to a tutor.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::chats::handlers::UserIdQuery;
use crate::chats::owned_chat;
use crate::conversation::orchestrator::TurnOutcome;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    pub attachments: Option<Value>,
}

/// POST /api/chats/:id/messages
///
/// Stores the user's message, asks the tutor model for a reply and stores that
/// too. On inference failure the user message stays stored and its id is in
/// the error body.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<TurnOutcome>), AppError> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let chat = owned_chat(state.chats.as_ref(), chat_id, params.user_id).await?;
    let tutor = state
        .chats
        .find_tutor(chat.tutor_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tutor {} not found", chat.tutor_id)))?;

    let outcome = state
        .orchestrator
        .send_turn(&chat, &tutor, req.content, req.attachments)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
