//! Usage tracking per (user, tutor), in minutes. Rows are created lazily.

pub mod handlers;

use serde::Deserialize;
use sqlx::PgPool;

use crate::models::progress::ProgressRow;

#[derive(Debug, Default, Deserialize)]
pub struct ProgressUpdate {
    pub set_minutes: Option<i32>,
    pub add_minutes: Option<i32>,
}

/// `set_minutes` replaces the total, then `add_minutes` is added. Never below zero.
pub fn apply_update(current: i32, update: &ProgressUpdate) -> i32 {
    let base = update.set_minutes.unwrap_or(current);
    base.saturating_add(update.add_minutes.unwrap_or(0)).max(0)
}

pub async fn tutor_exists(pool: &PgPool, tutor_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tutors WHERE id = $1)")
        .bind(tutor_id)
        .fetch_one(pool)
        .await
}

pub async fn get_or_create(
    pool: &PgPool,
    user_id: i64,
    tutor_id: i64,
) -> Result<ProgressRow, sqlx::Error> {
    sqlx::query(
        "INSERT INTO progress (user_id, tutor_id) VALUES ($1, $2) ON CONFLICT (user_id, tutor_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(tutor_id)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, ProgressRow>("SELECT * FROM progress WHERE user_id = $1 AND tutor_id = $2")
        .bind(user_id)
        .bind(tutor_id)
        .fetch_one(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    user_id: i64,
    tutor_id: i64,
    update: &ProgressUpdate,
) -> Result<ProgressRow, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO progress (user_id, tutor_id) VALUES ($1, $2) ON CONFLICT (user_id, tutor_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(tutor_id)
    .execute(&mut *tx)
    .await?;

    let current: i32 = sqlx::query_scalar(
        "SELECT total_minutes FROM progress WHERE user_id = $1 AND tutor_id = $2 FOR UPDATE",
    )
    .bind(user_id)
    .bind(tutor_id)
    .fetch_one(&mut *tx)
    .await?;

    let row = sqlx::query_as::<_, ProgressRow>(
        "UPDATE progress SET total_minutes = $1 WHERE user_id = $2 AND tutor_id = $3 RETURNING *",
    )
    .bind(apply_update(current, update))
    .bind(user_id)
    .bind(tutor_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}
