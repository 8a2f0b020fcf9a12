//! Chat lifecycle: one chat per (user, tutor), listing, renaming, deletion.

pub mod handlers;

use crate::errors::AppError;
use crate::models::chat::{ChatRow, ChatView};
use crate::store::ChatStore;

const PREVIEW_CHARS: usize = 50;

/// Loads a chat the caller owns. Chats of other users read as missing.
pub async fn owned_chat(
    store: &dyn ChatStore,
    chat_id: i64,
    user_id: i64,
) -> Result<ChatRow, AppError> {
    store
        .find_chat(chat_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Chat {chat_id} not found")))
}

/// Embeds the chat's tutor and shortens the message preview.
pub async fn chat_view(
    store: &dyn ChatStore,
    chat: ChatRow,
    last_message: Option<String>,
) -> Result<ChatView, AppError> {
    let tutor = store
        .find_tutor(chat.tutor_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tutor {} not found", chat.tutor_id)))?;

    Ok(ChatView {
        chat,
        tutor,
        last_message: last_message.as_deref().map(preview),
        unread_count: 0,
    })
}

/// The user's chats, most recently active first.
pub async fn list_for_user(
    store: &dyn ChatStore,
    user_id: i64,
) -> Result<Vec<ChatView>, AppError> {
    let items = store.list_chats(user_id).await?;
    let mut views = Vec::with_capacity(items.len());
    for item in items {
        views.push(chat_view(store, item.chat, item.last_message).await?);
    }
    Ok(views)
}

/// First 50 characters, with "..." only when something was cut.
fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
