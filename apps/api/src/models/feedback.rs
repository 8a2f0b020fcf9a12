use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRow {
    pub id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub tutor_id: i64,
    pub message_id: Option<i64>,
    pub feedback_type: String,
    pub rating: Option<i16>,
    pub positive_text: Option<String>,
    pub improvement_text: Option<String>,
    pub quick_reaction: Option<String>,
    pub allow_training: bool,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    #[default]
    Detailed,
    QuickReaction,
}

impl FeedbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackKind::Detailed => "detailed",
            FeedbackKind::QuickReaction => "quick_reaction",
        }
    }
}

/// One-tap reactions offered under an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickReaction {
    Helpful,
    ExplainSimpler,
    MoreExamples,
    Confused,
}

impl QuickReaction {
    pub fn as_str(self) -> &'static str {
        match self {
            QuickReaction::Helpful => "helpful",
            QuickReaction::ExplainSimpler => "explain_simpler",
            QuickReaction::MoreExamples => "more_examples",
            QuickReaction::Confused => "confused",
        }
    }
}
