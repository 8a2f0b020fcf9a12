use serde::Serialize;
use sqlx::FromRow;

/// Minutes a user has spent with one tutor.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProgressRow {
    pub id: i64,
    pub user_id: i64,
    pub tutor_id: i64,
    pub total_minutes: i32,
}
