//! Persistence seam for chats, messages and feedback.
//!
//! Handlers and the conversation pipeline talk to `ChatStore` / `FeedbackStore`,
//! never to the pool directly. `PgStore` is the production implementation;
//! tests run against `memory::MemoryStore`.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::chat::{ChatListItem, ChatRow, MessageRole, MessageRow};
use crate::models::feedback::{FeedbackKind, FeedbackRow, QuickReaction};
use crate::models::tutor::TutorRow;
use crate::rating::RatingSummary;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A message about to be appended to a chat's history.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: i64,
    pub role: MessageRole,
    pub content: String,
    pub attachments: Option<Value>,
    pub metadata: Option<Value>,
}

impl NewMessage {
    pub fn user(chat_id: i64, content: String, attachments: Option<Value>) -> Self {
        Self {
            chat_id,
            role: MessageRole::User,
            content,
            attachments,
            metadata: None,
        }
    }

    pub fn assistant(chat_id: i64, content: String, metadata: Value) -> Self {
        Self {
            chat_id,
            role: MessageRole::Assistant,
            content,
            attachments: None,
            metadata: Some(metadata),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub chat_id: i64,
    pub user_id: i64,
    pub tutor_id: i64,
    pub message_id: Option<i64>,
    pub kind: FeedbackKind,
    pub rating: Option<i16>,
    pub positive_text: Option<String>,
    pub improvement_text: Option<String>,
    pub quick_reaction: Option<QuickReaction>,
    pub allow_training: bool,
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn find_tutor(&self, tutor_id: i64) -> Result<Option<TutorRow>, StoreError>;

    /// Looks a chat up by id, scoped to its owner.
    async fn find_chat(&self, chat_id: i64, user_id: i64) -> Result<Option<ChatRow>, StoreError>;

    /// Returns the chat for (user, tutor), creating it on first contact.
    /// The bool is true when a new chat was created.
    async fn get_or_create_chat(
        &self,
        user_id: i64,
        tutor_id: i64,
    ) -> Result<(ChatRow, bool), StoreError>;

    /// The user's chats, most recently active first.
    async fn list_chats(&self, user_id: i64) -> Result<Vec<ChatListItem>, StoreError>;

    async fn rename_chat(
        &self,
        chat_id: i64,
        user_id: i64,
        custom_name: Option<String>,
    ) -> Result<Option<ChatRow>, StoreError>;

    /// Deletes the chat; messages and feedback go with it. Returns false if absent.
    async fn delete_chat(&self, chat_id: i64, user_id: i64) -> Result<bool, StoreError>;

    /// Removes every message of the chat and resets `last_message_at`.
    async fn clear_messages(&self, chat_id: i64) -> Result<u64, StoreError>;

    async fn append_message(&self, message: NewMessage) -> Result<MessageRow, StoreError>;

    /// Appends a reply and moves the chat's `last_message_at` to the reply's
    /// `created_at`, both in one transaction.
    async fn append_reply(&self, message: NewMessage) -> Result<MessageRow, StoreError>;

    /// Up to `limit` messages, newest first, optionally restricted to ids below `before_id`.
    async fn recent_messages(
        &self,
        chat_id: i64,
        before_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<MessageRow>, StoreError>;

    async fn count_messages(&self, chat_id: i64) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn insert_feedback(&self, feedback: &NewFeedback) -> Result<FeedbackRow, StoreError>;

    /// Recomputes the tutor's aggregate from every non-null rating and stores it.
    /// Reading the scores and writing the result happen atomically with respect
    /// to other recomputes for the same tutor.
    async fn recompute_tutor_rating(
        &self,
        tutor_id: i64,
        summarize: for<'a> fn(&'a [i16]) -> RatingSummary,
    ) -> Result<RatingSummary, StoreError>;

    /// Queues the feedback for training export if the user allowed it.
    async fn mark_for_training(&self, feedback_id: i64) -> Result<(), StoreError>;

    /// Training-export queue: unprocessed, training-allowed, oldest first.
    async fn unprocessed_feedback(&self, limit: i64) -> Result<Vec<FeedbackRow>, StoreError>;

    async fn mark_processed(&self, feedback_id: i64) -> Result<bool, StoreError>;
}
