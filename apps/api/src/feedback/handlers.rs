use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::chats::handlers::UserIdQuery;
use crate::chats::owned_chat;
use crate::errors::AppError;
use crate::feedback::{clamp_export_batch, submit};
use crate::models::feedback::{FeedbackKind, FeedbackRow, QuickReaction};
use crate::state::AppState;
use crate::store::NewFeedback;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

fn default_allow_training() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct DetailedFeedbackRequest {
    pub chat_id: i64,
    pub message_id: Option<i64>,
    pub rating: Option<i16>,
    pub positive_text: Option<String>,
    pub improvement_text: Option<String>,
    #[serde(default = "default_allow_training")]
    pub allow_training: bool,
}

#[derive(Debug, Deserialize)]
pub struct QuickFeedbackRequest {
    pub chat_id: i64,
    /// The assistant message being reacted to.
    pub message_id: i64,
    pub quick_reaction: QuickReaction,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct MarkProcessedResponse {
    pub id: i64,
    pub processed: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/feedbacks
pub async fn handle_detailed_feedback(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<DetailedFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackRow>), AppError> {
    let chat = owned_chat(state.chats.as_ref(), req.chat_id, params.user_id).await?;

    let row = submit(
        state.feedback.as_ref(),
        NewFeedback {
            chat_id: chat.id,
            user_id: params.user_id,
            tutor_id: chat.tutor_id,
            message_id: req.message_id,
            kind: FeedbackKind::Detailed,
            rating: req.rating,
            positive_text: non_blank(req.positive_text),
            improvement_text: non_blank(req.improvement_text),
            quick_reaction: None,
            allow_training: req.allow_training,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/feedbacks/quick
///
/// One-tap reactions carry no rating and are always usable for training.
pub async fn handle_quick_feedback(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<QuickFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackRow>), AppError> {
    let chat = owned_chat(state.chats.as_ref(), req.chat_id, params.user_id).await?;

    let row = submit(
        state.feedback.as_ref(),
        NewFeedback {
            chat_id: chat.id,
            user_id: params.user_id,
            tutor_id: chat.tutor_id,
            message_id: Some(req.message_id),
            kind: FeedbackKind::QuickReaction,
            rating: None,
            positive_text: None,
            improvement_text: None,
            quick_reaction: Some(req.quick_reaction),
            allow_training: true,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/feedbacks/unprocessed?limit=
///
/// Training-export queue, oldest first.
pub async fn handle_unprocessed_feedback(
    State(state): State<AppState>,
    Query(params): Query<ExportQuery>,
) -> Result<Json<Vec<FeedbackRow>>, AppError> {
    let rows = state
        .feedback
        .unprocessed_feedback(clamp_export_batch(params.limit))
        .await?;
    Ok(Json(rows))
}

/// PATCH /api/feedbacks/:id/mark-processed
pub async fn handle_mark_processed(
    State(state): State<AppState>,
    Path(feedback_id): Path<i64>,
) -> Result<Json<MarkProcessedResponse>, AppError> {
    if !state.feedback.mark_processed(feedback_id).await? {
        return Err(AppError::NotFound(format!(
            "Feedback {feedback_id} not found"
        )));
    }
    Ok(Json(MarkProcessedResponse {
        id: feedback_id,
        processed: true,
    }))
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}
