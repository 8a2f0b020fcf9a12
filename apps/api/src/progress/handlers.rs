use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::chats::handlers::UserIdQuery;
use crate::errors::AppError;
use crate::models::progress::ProgressRow;
use crate::progress::{get_or_create, tutor_exists, update, ProgressUpdate};
use crate::state::AppState;

/// GET /api/progress/:tutor_id
pub async fn handle_get_progress(
    State(state): State<AppState>,
    Path(tutor_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProgressRow>, AppError> {
    ensure_tutor(&state, tutor_id).await?;
    Ok(Json(get_or_create(&state.db, params.user_id, tutor_id).await?))
}

/// PATCH /api/progress/:tutor_id
pub async fn handle_update_progress(
    State(state): State<AppState>,
    Path(tutor_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<ProgressUpdate>,
) -> Result<Json<ProgressRow>, AppError> {
    ensure_tutor(&state, tutor_id).await?;
    let row = update(&state.db, params.user_id, tutor_id, &req).await?;
    info!(
        "User {} now has {} minutes with tutor {tutor_id}",
        params.user_id, row.total_minutes
    );
    Ok(Json(row))
}

async fn ensure_tutor(state: &AppState, tutor_id: i64) -> Result<(), AppError> {
    if !tutor_exists(&state.db, tutor_id).await? {
        return Err(AppError::NotFound(format!("Tutor {tutor_id} not found")));
    }
    Ok(())
}
