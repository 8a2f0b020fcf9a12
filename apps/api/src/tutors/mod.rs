//! Tutor catalogue: active tutors, optionally filtered by their course.

pub mod handlers;

use serde::Deserialize;
use sqlx::PgPool;

use crate::models::tutor::TutorRow;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct TutorFilter {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

impl TutorFilter {
    /// 1-based page number.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }
}

/// One page of active tutors plus the total matching count.
pub async fn list_active(
    pool: &PgPool,
    filter: &TutorFilter,
) -> Result<(Vec<TutorRow>, i64), sqlx::Error> {
    let tutors = sqlx::query_as::<_, TutorRow>(
        r#"
        SELECT t.*
        FROM tutors t
        LEFT JOIN courses c ON c.id = t.course_id
        WHERE t.is_active = TRUE
          AND ($1::TEXT IS NULL OR c.category = $1)
          AND ($2::TEXT IS NULL OR c.difficulty_level = $2)
        ORDER BY t.id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&filter.category)
    .bind(&filter.difficulty)
    .bind(filter.page_size())
    .bind(filter.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM tutors t
        LEFT JOIN courses c ON c.id = t.course_id
        WHERE t.is_active = TRUE
          AND ($1::TEXT IS NULL OR c.category = $1)
          AND ($2::TEXT IS NULL OR c.difficulty_level = $2)
        "#,
    )
    .bind(&filter.category)
    .bind(&filter.difficulty)
    .fetch_one(pool)
    .await?;

    Ok((tutors, total))
}
