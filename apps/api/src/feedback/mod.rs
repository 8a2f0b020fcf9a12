//! Feedback intake and the training-export queue.
//!
//! Every rated submission triggers a full recomputation of the tutor's rating.
//! Submissions that allow training are queued for export.

pub mod handlers;

use thiserror::Error;
use tracing::info;

use crate::models::feedback::FeedbackRow;
use crate::rating;
use crate::store::{FeedbackStore, NewFeedback, StoreError};

pub const DEFAULT_EXPORT_BATCH: i64 = 100;
pub const MAX_EXPORT_BATCH: i64 = 1000;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(i16),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub async fn submit(
    store: &dyn FeedbackStore,
    feedback: NewFeedback,
) -> Result<FeedbackRow, FeedbackError> {
    if let Some(score) = feedback.rating {
        if !(1..=5).contains(&score) {
            return Err(FeedbackError::InvalidRating(score));
        }
    }

    let row = store.insert_feedback(&feedback).await?;
    info!(
        "Stored {} feedback {} for tutor {}",
        row.feedback_type, row.id, row.tutor_id
    );

    if row.rating.is_some() {
        rating::recompute(store, row.tutor_id).await?;
    }
    if row.allow_training {
        store.mark_for_training(row.id).await?;
    }

    Ok(row)
}

pub fn clamp_export_batch(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_EXPORT_BATCH)
        .clamp(1, MAX_EXPORT_BATCH)
}
