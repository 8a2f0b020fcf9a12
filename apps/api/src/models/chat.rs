use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use thiserror::Error;

use crate::models::tutor::TutorRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatRow {
    pub id: i64,
    pub user_id: i64,
    pub tutor_id: i64,
    pub custom_name: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A chat as shown in the user's chat list, with a preview of its latest message.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChatListItem {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub chat: ChatRow,
    pub last_message: Option<String>,
}

/// A chat as returned to clients, with its tutor embedded.
#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    #[serde(flatten)]
    pub chat: ChatRow,
    pub tutor: TutorRow,
    pub last_message: Option<String>,
    /// Read receipts are not tracked; always 0.
    pub unread_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown message role '{0}'")]
pub struct UnknownRole(pub String);

impl TryFrom<&str> for MessageRole {
    type Error = UnknownRole;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// One persisted turn. Ordered within a chat by (created_at, id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: i64,
    pub chat_id: i64,
    pub role: MessageRole,
    pub content: String,
    pub attachments: Option<Value>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for MessageRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: &str = row.try_get("role")?;
        let role = MessageRole::try_from(role).map_err(|e| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: Box::new(e),
        })?;

        Ok(MessageRow {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            role,
            content: row.try_get("content")?,
            attachments: row.try_get("attachments")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
