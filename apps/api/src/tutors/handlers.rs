use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::tutor::TutorRow;
use crate::state::AppState;
use crate::tutors::{list_active, TutorFilter};

#[derive(Serialize)]
pub struct TutorListResponse {
    pub tutors: Vec<TutorRow>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// GET /api/tutors?page=&page_size=&category=&difficulty=
pub async fn handle_list_tutors(
    State(state): State<AppState>,
    Query(filter): Query<TutorFilter>,
) -> Result<Json<TutorListResponse>, AppError> {
    let (tutors, total) = list_active(&state.db, &filter).await?;
    Ok(Json(TutorListResponse {
        tutors,
        total,
        page: filter.page(),
        page_size: filter.page_size(),
    }))
}

/// GET /api/tutors/:id
pub async fn handle_get_tutor(
    State(state): State<AppState>,
    Path(tutor_id): Path<i64>,
) -> Result<Json<TutorRow>, AppError> {
    state
        .chats
        .find_tutor(tutor_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Tutor {tutor_id} not found")))
}
