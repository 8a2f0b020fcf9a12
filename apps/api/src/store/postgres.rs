use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{ChatStore, FeedbackStore, NewFeedback, NewMessage, StoreError};
use crate::models::chat::{ChatListItem, ChatRow, MessageRow};
use crate::models::feedback::FeedbackRow;
use crate::models::tutor::TutorRow;
use crate::rating::RatingSummary;

const INSERT_MESSAGE: &str = r#"
    INSERT INTO messages (chat_id, role, content, attachments, metadata)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING *
"#;

/// PostgreSQL-backed store. Every method is its own statement or transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn find_tutor(&self, tutor_id: i64) -> Result<Option<TutorRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, TutorRow>("SELECT * FROM tutors WHERE id = $1")
                .bind(tutor_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_chat(&self, chat_id: i64, user_id: i64) -> Result<Option<ChatRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, ChatRow>("SELECT * FROM chats WHERE id = $1 AND user_id = $2")
                .bind(chat_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_or_create_chat(
        &self,
        user_id: i64,
        tutor_id: i64,
    ) -> Result<(ChatRow, bool), StoreError> {
        // ON CONFLICT keeps the (user, tutor) uniqueness race-free.
        let inserted = sqlx::query_as::<_, ChatRow>(
            r#"
            INSERT INTO chats (user_id, tutor_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, tutor_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tutor_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(chat) = inserted {
            return Ok((chat, true));
        }

        let existing = sqlx::query_as::<_, ChatRow>(
            "SELECT * FROM chats WHERE user_id = $1 AND tutor_id = $2",
        )
        .bind(user_id)
        .bind(tutor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((existing, false))
    }

    async fn list_chats(&self, user_id: i64) -> Result<Vec<ChatListItem>, StoreError> {
        Ok(sqlx::query_as::<_, ChatListItem>(
            r#"
            SELECT c.*,
                   (SELECT m.content
                    FROM messages m
                    WHERE m.chat_id = c.id
                    ORDER BY m.created_at DESC, m.id DESC
                    LIMIT 1) AS last_message
            FROM chats c
            WHERE c.user_id = $1
            ORDER BY c.last_message_at DESC NULLS LAST, c.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn rename_chat(
        &self,
        chat_id: i64,
        user_id: i64,
        custom_name: Option<String>,
    ) -> Result<Option<ChatRow>, StoreError> {
        Ok(sqlx::query_as::<_, ChatRow>(
            "UPDATE chats SET custom_name = $1 WHERE id = $2 AND user_id = $3 RETURNING *",
        )
        .bind(custom_name)
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_chat(&self, chat_id: i64, user_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_messages(&self, chat_id: i64) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM messages WHERE chat_id = $1")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("UPDATE chats SET last_message_at = NULL WHERE id = $1")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted)
    }

    async fn append_message(&self, message: NewMessage) -> Result<MessageRow, StoreError> {
        let row = sqlx::query_as::<_, MessageRow>(INSERT_MESSAGE)
            .bind(message.chat_id)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(&message.attachments)
            .bind(&message.metadata)
            .fetch_one(&self.pool)
            .await?;

        debug!("Appended {} message {} to chat {}", row.role, row.id, row.chat_id);
        Ok(row)
    }

    async fn append_reply(&self, message: NewMessage) -> Result<MessageRow, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, MessageRow>(INSERT_MESSAGE)
            .bind(message.chat_id)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(&message.attachments)
            .bind(&message.metadata)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE chats SET last_message_at = $1 WHERE id = $2")
            .bind(row.created_at)
            .bind(row.chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!("Appended {} message {} to chat {}", row.role, row.id, row.chat_id);
        Ok(row)
    }

    async fn recent_messages(
        &self,
        chat_id: i64,
        before_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<MessageRow>, StoreError> {
        Ok(sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT *
            FROM messages
            WHERE chat_id = $1
              AND ($2::BIGINT IS NULL OR id < $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(chat_id)
        .bind(before_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count_messages(&self, chat_id: i64) -> Result<i64, StoreError> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE chat_id = $1")
                .bind(chat_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }
}

#[async_trait]
impl FeedbackStore for PgStore {
    async fn insert_feedback(&self, feedback: &NewFeedback) -> Result<FeedbackRow, StoreError> {
        Ok(sqlx::query_as::<_, FeedbackRow>(
            r#"
            INSERT INTO feedbacks
                (chat_id, user_id, tutor_id, message_id, feedback_type, rating,
                 positive_text, improvement_text, quick_reaction, allow_training, processed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE)
            RETURNING *
            "#,
        )
        .bind(feedback.chat_id)
        .bind(feedback.user_id)
        .bind(feedback.tutor_id)
        .bind(feedback.message_id)
        .bind(feedback.kind.as_str())
        .bind(feedback.rating)
        .bind(&feedback.positive_text)
        .bind(&feedback.improvement_text)
        .bind(feedback.quick_reaction.map(|r| r.as_str()))
        .bind(feedback.allow_training)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn recompute_tutor_rating(
        &self,
        tutor_id: i64,
        summarize: for<'a> fn(&'a [i16]) -> RatingSummary,
    ) -> Result<RatingSummary, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the tutor serializes concurrent recomputes; each one then
        // reads every score committed before it got the lock.
        sqlx::query("SELECT id FROM tutors WHERE id = $1 FOR UPDATE")
            .bind(tutor_id)
            .fetch_optional(&mut *tx)
            .await?;

        let scores = sqlx::query_scalar::<_, i16>(
            "SELECT rating FROM feedbacks WHERE tutor_id = $1 AND rating IS NOT NULL",
        )
        .bind(tutor_id)
        .fetch_all(&mut *tx)
        .await?;

        let summary = summarize(&scores);

        sqlx::query(
            "UPDATE tutors SET rating = $1, total_feedbacks = $2, updated_at = now() WHERE id = $3",
        )
        .bind(summary.rating())
        .bind(summary.total_feedbacks())
        .bind(tutor_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(summary)
    }

    async fn mark_for_training(&self, feedback_id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE feedbacks SET processed = FALSE WHERE id = $1 AND allow_training")
            .bind(feedback_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn unprocessed_feedback(&self, limit: i64) -> Result<Vec<FeedbackRow>, StoreError> {
        Ok(sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT *
            FROM feedbacks
            WHERE processed = FALSE AND allow_training = TRUE
            ORDER BY created_at, id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn mark_processed(&self, feedback_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE feedbacks SET processed = TRUE WHERE id = $1")
            .bind(feedback_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
