use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chats::{chat_view, list_for_user, owned_chat};
use crate::errors::AppError;
use crate::models::chat::ChatView;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: i64,
}

#[derive(Deserialize)]
pub struct CreateChatRequest {
    pub tutor_id: i64,
}

#[derive(Deserialize)]
pub struct RenameChatRequest {
    pub custom_name: Option<String>,
}

#[derive(Serialize)]
pub struct ChatListResponse {
    pub chats: Vec<ChatView>,
    pub total: usize,
}

/// POST /api/chats
///
/// Returns the caller's chat with the tutor, creating it on first contact.
pub async fn handle_create_chat(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatView>), AppError> {
    let tutor = state
        .chats
        .find_tutor(req.tutor_id)
        .await?
        .filter(|t| t.is_active)
        .ok_or_else(|| AppError::NotFound(format!("Tutor {} not found", req.tutor_id)))?;

    let (chat, created) = state
        .chats
        .get_or_create_chat(params.user_id, tutor.id)
        .await?;

    let status = if created {
        info!("Created chat {} for user {} with tutor {}", chat.id, chat.user_id, tutor.id);
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(ChatView {
            chat,
            tutor,
            last_message: None,
            unread_count: 0,
        }),
    ))
}

/// GET /api/chats
pub async fn handle_list_chats(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ChatListResponse>, AppError> {
    let chats = list_for_user(state.chats.as_ref(), params.user_id).await?;
    Ok(Json(ChatListResponse {
        total: chats.len(),
        chats,
    }))
}

/// GET /api/chats/:id
pub async fn handle_get_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ChatView>, AppError> {
    let chat = owned_chat(state.chats.as_ref(), chat_id, params.user_id).await?;
    Ok(Json(chat_view(state.chats.as_ref(), chat, None).await?))
}

/// PATCH /api/chats/:id
///
/// A blank or missing name resets the chat to the tutor's name.
pub async fn handle_rename_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<RenameChatRequest>,
) -> Result<Json<ChatView>, AppError> {
    let custom_name = req
        .custom_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    if custom_name.as_ref().is_some_and(|name| name.chars().count() > 255) {
        return Err(AppError::Validation(
            "custom_name must be at most 255 characters".to_string(),
        ));
    }

    let chat = state
        .chats
        .rename_chat(chat_id, params.user_id, custom_name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Chat {chat_id} not found")))?;
    Ok(Json(chat_view(state.chats.as_ref(), chat, None).await?))
}

/// DELETE /api/chats/:id
pub async fn handle_delete_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    if !state.chats.delete_chat(chat_id, params.user_id).await? {
        return Err(AppError::NotFound(format!("Chat {chat_id} not found")));
    }
    info!("Deleted chat {chat_id} for user {}", params.user_id);
    Ok(StatusCode::NO_CONTENT)
}
