//! Backward cursor pagination over a chat's messages.
//!
//! Pages are returned oldest-first. A client walks further back by passing the
//! id of the oldest message it holds as `before_id`.

pub mod handlers;

use serde::Serialize;

use crate::models::chat::MessageRow;
use crate::store::{ChatStore, StoreError};

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Out-of-range limits are clamped rather than rejected.
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT)
}

#[derive(Debug, Serialize)]
pub struct MessagePage {
    pub messages: Vec<MessageRow>,
    pub has_more: bool,
    /// Every message in the chat, regardless of cursor.
    pub total: i64,
}

/// Fetches one page: at most `limit` messages older than `before_id` (or the
/// newest ones when absent).
pub async fn fetch_page(
    store: &dyn ChatStore,
    chat_id: i64,
    limit: i64,
    before_id: Option<i64>,
) -> Result<MessagePage, StoreError> {
    let rows = store.recent_messages(chat_id, before_id, limit + 1).await?;
    let (messages, has_more) = into_page(rows, limit);
    let total = store.count_messages(chat_id).await?;

    Ok(MessagePage {
        messages,
        has_more,
        total,
    })
}

/// `newest_first` holds up to `limit + 1` rows; the extra one only signals that
/// older messages exist.
fn into_page(mut newest_first: Vec<MessageRow>, limit: i64) -> (Vec<MessageRow>, bool) {
    let limit = limit.max(0) as usize;
    let has_more = newest_first.len() > limit;
    newest_first.truncate(limit);
    newest_first.reverse();
    (newest_first, has_more)
}
