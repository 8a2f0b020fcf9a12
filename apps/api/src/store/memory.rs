//! In-memory store used by unit and router tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::{ChatStore, FeedbackStore, NewFeedback, NewMessage, StoreError};
use crate::models::chat::{ChatListItem, ChatRow, MessageRow};
use crate::models::feedback::FeedbackRow;
use crate::models::tutor::TutorRow;
use crate::rating::RatingSummary;

#[derive(Default)]
struct Tables {
    tutors: Vec<TutorRow>,
    chats: Vec<ChatRow>,
    messages: Vec<MessageRow>,
    feedbacks: Vec<FeedbackRow>,
    next_id: i64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing timestamps, like a single-writer database clock.
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn insert_message(&mut self, message: NewMessage) -> MessageRow {
        let row = MessageRow {
            id: self.next_id(),
            chat_id: message.chat_id,
            role: message.role,
            content: message.content,
            attachments: message.attachments,
            metadata: message.metadata,
            created_at: self.now(),
        };
        self.messages.push(row.clone());
        row
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_replies: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tutor(&self, name: &str, system_prompt: Option<&str>) -> TutorRow {
        let mut tables = self.tables.lock().unwrap();
        let tutor = TutorRow {
            id: tables.next_id(),
            course_id: None,
            name: name.to_string(),
            description: None,
            avatar_url: None,
            model_id: "tutor_python_v1".to_string(),
            system_prompt: system_prompt.map(str::to_string),
            knowledge_base_id: None,
            rating: 0.0,
            total_feedbacks: 0,
            is_active: true,
            created_at: tables.now(),
            updated_at: None,
        };
        tables.tutors.push(tutor.clone());
        tutor
    }

    /// Makes every subsequent `append_reply` fail.
    pub fn fail_replies(&self) {
        self.fail_replies.store(true, Ordering::SeqCst);
    }

    pub fn messages_of(&self, chat_id: i64) -> Vec<MessageRow> {
        let tables = self.tables.lock().unwrap();
        tables
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub fn chat(&self, chat_id: i64) -> Option<ChatRow> {
        let tables = self.tables.lock().unwrap();
        tables.chats.iter().find(|c| c.id == chat_id).cloned()
    }

    pub fn tutor(&self, tutor_id: i64) -> Option<TutorRow> {
        let tables = self.tables.lock().unwrap();
        tables.tutors.iter().find(|t| t.id == tutor_id).cloned()
    }

    pub fn feedback(&self, feedback_id: i64) -> Option<FeedbackRow> {
        let tables = self.tables.lock().unwrap();
        tables.feedbacks.iter().find(|f| f.id == feedback_id).cloned()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn find_tutor(&self, tutor_id: i64) -> Result<Option<TutorRow>, StoreError> {
        Ok(self.tutor(tutor_id))
    }

    async fn find_chat(&self, chat_id: i64, user_id: i64) -> Result<Option<ChatRow>, StoreError> {
        Ok(self.chat(chat_id).filter(|c| c.user_id == user_id))
    }

    async fn get_or_create_chat(
        &self,
        user_id: i64,
        tutor_id: i64,
    ) -> Result<(ChatRow, bool), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables
            .chats
            .iter()
            .find(|c| c.user_id == user_id && c.tutor_id == tutor_id)
        {
            return Ok((existing.clone(), false));
        }
        let chat = ChatRow {
            id: tables.next_id(),
            user_id,
            tutor_id,
            custom_name: None,
            last_message_at: None,
            created_at: tables.now(),
        };
        tables.chats.push(chat.clone());
        Ok((chat, true))
    }

    async fn list_chats(&self, user_id: i64) -> Result<Vec<ChatListItem>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut items: Vec<ChatListItem> = tables
            .chats
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|chat| ChatListItem {
                chat: chat.clone(),
                last_message: tables
                    .messages
                    .iter()
                    .filter(|m| m.chat_id == chat.id)
                    .max_by_key(|m| (m.created_at, m.id))
                    .map(|m| m.content.clone()),
            })
            .collect();
        // NULLS LAST, newest activity first.
        items.sort_by(|a, b| {
            b.chat
                .last_message_at
                .cmp(&a.chat.last_message_at)
                .then(b.chat.id.cmp(&a.chat.id))
        });
        Ok(items)
    }

    async fn rename_chat(
        &self,
        chat_id: i64,
        user_id: i64,
        custom_name: Option<String>,
    ) -> Result<Option<ChatRow>, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let chat = tables
            .chats
            .iter_mut()
            .find(|c| c.id == chat_id && c.user_id == user_id);
        Ok(chat.map(|c| {
            c.custom_name = custom_name;
            c.clone()
        }))
    }

    async fn delete_chat(&self, chat_id: i64, user_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.chats.len();
        tables
            .chats
            .retain(|c| !(c.id == chat_id && c.user_id == user_id));
        if tables.chats.len() == before {
            return Ok(false);
        }
        tables.messages.retain(|m| m.chat_id != chat_id);
        tables.feedbacks.retain(|f| f.chat_id != chat_id);
        Ok(true)
    }

    async fn clear_messages(&self, chat_id: i64) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.messages.len();
        tables.messages.retain(|m| m.chat_id != chat_id);
        let deleted = (before - tables.messages.len()) as u64;
        if let Some(chat) = tables.chats.iter_mut().find(|c| c.id == chat_id) {
            chat.last_message_at = None;
        }
        Ok(deleted)
    }

    async fn append_message(&self, message: NewMessage) -> Result<MessageRow, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.insert_message(message))
    }

    async fn append_reply(&self, message: NewMessage) -> Result<MessageRow, StoreError> {
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut tables = self.tables.lock().unwrap();
        let row = tables.insert_message(message);
        if let Some(chat) = tables.chats.iter_mut().find(|c| c.id == row.chat_id) {
            chat.last_message_at = Some(row.created_at);
        }
        Ok(row)
    }

    async fn recent_messages(
        &self,
        chat_id: i64,
        before_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<MessageRow>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<MessageRow> = tables
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .filter(|m| before_id.map_or(true, |before| m.id < before))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn count_messages(&self, chat_id: i64) -> Result<i64, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.messages.iter().filter(|m| m.chat_id == chat_id).count() as i64)
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn insert_feedback(&self, feedback: &NewFeedback) -> Result<FeedbackRow, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let row = FeedbackRow {
            id: tables.next_id(),
            chat_id: feedback.chat_id,
            user_id: feedback.user_id,
            tutor_id: feedback.tutor_id,
            message_id: feedback.message_id,
            feedback_type: feedback.kind.as_str().to_string(),
            rating: feedback.rating,
            positive_text: feedback.positive_text.clone(),
            improvement_text: feedback.improvement_text.clone(),
            quick_reaction: feedback.quick_reaction.map(|r| r.as_str().to_string()),
            allow_training: feedback.allow_training,
            processed: false,
            created_at: tables.now(),
        };
        tables.feedbacks.push(row.clone());
        Ok(row)
    }

    async fn recompute_tutor_rating(
        &self,
        tutor_id: i64,
        summarize: for<'a> fn(&'a [i16]) -> RatingSummary,
    ) -> Result<RatingSummary, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let scores: Vec<i16> = tables
            .feedbacks
            .iter()
            .filter(|f| f.tutor_id == tutor_id)
            .filter_map(|f| f.rating)
            .collect();
        let summary = summarize(&scores);
        if let Some(tutor) = tables.tutors.iter_mut().find(|t| t.id == tutor_id) {
            tutor.rating = summary.rating();
            tutor.total_feedbacks = summary.total_feedbacks();
        }
        Ok(summary)
    }

    async fn mark_for_training(&self, feedback_id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(feedback) = tables
            .feedbacks
            .iter_mut()
            .find(|f| f.id == feedback_id && f.allow_training)
        {
            feedback.processed = false;
        }
        Ok(())
    }

    async fn unprocessed_feedback(&self, limit: i64) -> Result<Vec<FeedbackRow>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<FeedbackRow> = tables
            .feedbacks
            .iter()
            .filter(|f| !f.processed && f.allow_training)
            .cloned()
            .collect();
        rows.sort_by_key(|f| (f.created_at, f.id));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn mark_processed(&self, feedback_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.feedbacks.iter_mut().find(|f| f.id == feedback_id) {
            Some(feedback) => {
                feedback.processed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
