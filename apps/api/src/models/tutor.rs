use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A tutor profile. `rating` and `total_feedbacks` are derived values owned by
/// `crate::rating`; nothing else writes them.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TutorRow {
    pub id: i64,
    pub course_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub model_id: String,
    #[serde(skip_serializing)]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing)]
    pub knowledge_base_id: Option<String>,
    pub rating: f64,
    pub total_feedbacks: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
