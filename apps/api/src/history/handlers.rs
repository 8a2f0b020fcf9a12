use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chats::handlers::UserIdQuery;
use crate::chats::owned_chat;
use crate::errors::AppError;
use crate::history::{clamp_limit, fetch_page, MessagePage};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MessagePageQuery {
    pub user_id: i64,
    pub limit: Option<i64>,
    pub before_id: Option<i64>,
}

#[derive(Serialize)]
pub struct ClearedMessagesResponse {
    pub chat_id: i64,
    pub deleted: u64,
}

/// GET /api/chats/:id/messages?limit=&before_id=
pub async fn handle_list_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Query(params): Query<MessagePageQuery>,
) -> Result<Json<MessagePage>, AppError> {
    let chat = owned_chat(state.chats.as_ref(), chat_id, params.user_id).await?;
    let page = fetch_page(
        state.chats.as_ref(),
        chat.id,
        clamp_limit(params.limit),
        params.before_id,
    )
    .await?;
    Ok(Json(page))
}

/// DELETE /api/chats/:id/messages
pub async fn handle_clear_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ClearedMessagesResponse>, AppError> {
    let chat = owned_chat(state.chats.as_ref(), chat_id, params.user_id).await?;
    let deleted = state.chats.clear_messages(chat.id).await?;
    info!("Cleared {deleted} messages from chat {}", chat.id);
    Ok(Json(ClearedMessagesResponse {
        chat_id: chat.id,
        deleted,
    }))
}
