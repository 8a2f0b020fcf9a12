//! Sole writer of a tutor's `rating` / `total_feedbacks`.
//!
//! Always a full recomputation over every rated feedback row for the tutor,
//! read and written in one store transaction. `RatingSummary` can only be built
//! here, so no other module can hand the store an aggregate it computed itself.

use serde::Serialize;
use tracing::info;

use crate::store::{FeedbackStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    rating: f64,
    total_feedbacks: i64,
}

impl RatingSummary {
    /// Mean of the scores rounded to 2 decimals, ties to even (4.125 -> 4.12);
    /// 0.0 when there are none.
    fn from_scores(scores: &[i16]) -> Self {
        if scores.is_empty() {
            return Self {
                rating: 0.0,
                total_feedbacks: 0,
            };
        }
        let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
        let mean = sum as f64 / scores.len() as f64;
        Self {
            rating: (mean * 100.0).round_ties_even() / 100.0,
            total_feedbacks: scores.len() as i64,
        }
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn total_feedbacks(&self) -> i64 {
        self.total_feedbacks
    }
}

/// Recomputes and stores the tutor's aggregate rating.
pub async fn recompute(
    store: &dyn FeedbackStore,
    tutor_id: i64,
) -> Result<RatingSummary, StoreError> {
    let summary = store
        .recompute_tutor_rating(tutor_id, RatingSummary::from_scores)
        .await?;

    info!(
        "Tutor {tutor_id} rating recomputed: {:.2} over {} feedbacks",
        summary.rating, summary.total_feedbacks
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::FeedbackKind;
    use crate::store::memory::MemoryStore;
    use crate::store::{ChatStore, NewFeedback};

    fn rated(chat_id: i64, tutor_id: i64, rating: Option<i16>) -> NewFeedback {
        NewFeedback {
            chat_id,
            user_id: 1,
            tutor_id,
            message_id: None,
            kind: FeedbackKind::Detailed,
            rating,
            positive_text: None,
            improvement_text: None,
            quick_reaction: None,
            allow_training: false,
        }
    }

    #[test]
    fn test_mean_is_rounded_to_two_decimals() {
        let summary = RatingSummary::from_scores(&[5, 5, 4]);
        assert_eq!(summary.rating(), 4.67);
        assert_eq!(summary.total_feedbacks(), 3);
    }

    #[test]
    fn test_no_scores_resets_to_zero() {
        let summary = RatingSummary::from_scores(&[]);
        assert_eq!(summary.rating(), 0.0);
        assert_eq!(summary.total_feedbacks(), 0);
    }

    #[test]
    fn test_half_way_means_round_to_even() {
        // 33 / 8 = 4.125 exactly
        assert_eq!(RatingSummary::from_scores(&[5, 4, 4, 4, 4, 4, 4, 4]).rating(), 4.12);
        // 35 / 8 = 4.375 exactly
        assert_eq!(RatingSummary::from_scores(&[5, 5, 5, 4, 4, 4, 4, 4]).rating(), 4.38);
    }

    #[test]
    fn test_exact_mean_is_unchanged() {
        assert_eq!(RatingSummary::from_scores(&[1, 2, 3, 4, 5]).rating(), 3.0);
        assert_eq!(RatingSummary::from_scores(&[4, 5]).rating(), 4.5);
    }

    #[tokio::test]
    async fn test_recompute_ignores_unrated_feedback_and_other_tutors() {
        let store = MemoryStore::new();
        let tutor = store.insert_tutor("Python", None);
        let other = store.insert_tutor("SQL", None);
        let (chat, _) = store.get_or_create_chat(1, tutor.id).await.unwrap();

        for rating in [Some(5), Some(5), None, Some(4)] {
            store.insert_feedback(&rated(chat.id, tutor.id, rating)).await.unwrap();
        }
        store.insert_feedback(&rated(chat.id, other.id, Some(1))).await.unwrap();

        let summary = recompute(&store, tutor.id).await.unwrap();
        assert_eq!(summary.rating(), 4.67);
        assert_eq!(summary.total_feedbacks(), 3);

        let stored = store.tutor(tutor.id).unwrap();
        assert_eq!(stored.rating, 4.67);
        assert_eq!(stored.total_feedbacks, 3);
    }

    #[tokio::test]
    async fn test_recompute_with_no_rated_feedback_writes_zero() {
        let store = MemoryStore::new();
        let tutor = store.insert_tutor("Python", None);

        let summary = recompute(&store, tutor.id).await.unwrap();
        assert_eq!(summary.rating(), 0.0);
        assert_eq!(store.tutor(tutor.id).unwrap().total_feedbacks, 0);
    }
}
